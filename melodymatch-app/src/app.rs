use crate::command::{Command, ParseCommandError};
use crate::player::build_player;
use crate::view;
use melodymatch_backend::HttpBackend;
use melodymatch_core::{
    Backend, CoreError, FeedController, FeedEvent, FeedSettings, MelodyMatchConfig, Notice,
    SessionGate, SwipeHandler, SwipeOutcome, create_playlist,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use url::Url;

const LOG_TARGET: &str = "melodymatch::app";

type InputLines = Lines<BufReader<Stdin>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Check the session, then run the feed until the user quits or the token is cancelled.
///
/// # Errors
///
/// Returns an error if the backend client cannot be created from the config.
pub async fn run(
    config: &MelodyMatchConfig,
    cancel_token: &CancellationToken,
) -> Result<(), CoreError> {
    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let sign_in_url = backend.sign_in_url()?;

    println!("{}", view::landing());
    println!("{}", view::CHECKING);

    let session = SessionGate::new(backend.clone(), config.session.checking_delay());
    let status = tokio::select! {
        () = cancel_token.cancelled() => return Ok(()),
        status = session.resolve() => status,
    };

    let lines = BufReader::new(tokio::io::stdin()).lines();

    if !status.is_authenticated() {
        sign_in_prompt(lines, &sign_in_url, cancel_token).await;
        return Ok(());
    }

    let feed = FeedController::new(
        backend.clone(),
        FeedSettings::from(&config.feed),
        build_player(&config.audio),
        Some(cancel_token),
    );
    let (notice_tx, notices) = mpsc::unbounded_channel();
    let mut session = FeedSession::new(feed, backend, sign_in_url, notice_tx);
    session.run(lines, notices, cancel_token).await;
    Ok(())
}

/// Not-logged-in view: the only way forward is signing in and restarting.
async fn sign_in_prompt(mut lines: InputLines, sign_in_url: &Url, cancel_token: &CancellationToken) {
    println!("{}", view::not_logged_in(sign_in_url.as_str()));

    loop {
        let line = tokio::select! {
            () = cancel_token.cancelled() => return,
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) => match line.parse::<Command>() {
                Ok(Command::SignIn) => {
                    open_sign_in(sign_in_url);
                    println!("Restart {} once you have signed in.", view::APP_NAME);
                }
                Ok(Command::Quit) => return,
                Err(ParseCommandError::Empty) => {}
                _ => println!("{}", view::not_logged_in(sign_in_url.as_str())),
            },
            Ok(None) => return,
            Err(e) => {
                error!(target: LOG_TARGET, "Failed to read input: {}", e);
                return;
            }
        }
    }
}

fn open_sign_in(sign_in_url: &Url) {
    info!(target: LOG_TARGET, "Opening {}", sign_in_url);
    if let Err(e) = open::that(sign_in_url.as_str()) {
        error!(target: LOG_TARGET, "Failed to open browser: {e}");
        println!("Open {sign_in_url} in your browser to sign in.");
    }
}

/// Authenticated session: routes input lines to the feed and prints its events.
struct FeedSession {
    feed: Arc<FeedController>,
    swipes: SwipeHandler,
    backend: Arc<dyn Backend>,
    sign_in_url: Url,
    notice_tx: mpsc::UnboundedSender<Notice>,
    awaiting_ack: bool,
}

impl FeedSession {
    fn new(
        feed: Arc<FeedController>,
        backend: Arc<dyn Backend>,
        sign_in_url: Url,
        notice_tx: mpsc::UnboundedSender<Notice>,
    ) -> Self {
        Self {
            swipes: SwipeHandler::new(feed.clone()),
            feed,
            backend,
            sign_in_url,
            notice_tx,
            awaiting_ack: false,
        }
    }

    async fn run(
        &mut self,
        mut lines: InputLines,
        mut notices: mpsc::UnboundedReceiver<Notice>,
        cancel_token: &CancellationToken,
    ) {
        let mut events = self.feed.subscribe();

        println!("{}", view::NO_GENRE);
        println!("Type `help` for all commands.");

        loop {
            tokio::select! {
                () = cancel_token.cancelled() => break,
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if self.handle_line(&line) == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!(target: LOG_TARGET, "Failed to read input: {}", e);
                        break;
                    }
                },
                event = events.recv() => match event {
                    Ok(event) => self.show_event(&event),
                    Err(RecvError::Lagged(n)) => {
                        info!(target: LOG_TARGET, "Missed {} feed events", n);
                    }
                    Err(RecvError::Closed) => break,
                },
                Some(notice) = notices.recv() => self.show_notice(&notice),
            }
        }

        info!(target: LOG_TARGET, "Leaving the feed");
        self.feed.shutdown();
    }

    fn handle_line(&mut self, line: &str) -> Flow {
        if self.awaiting_ack {
            self.awaiting_ack = false;
            return Flow::Continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Genre(genre)) => self.feed.set_genre(&genre),
            Ok(Command::Swipe(direction)) => {
                if self.swipes.on_swipe(direction) == SwipeOutcome::NoCard {
                    println!("{}", view::NO_CARD);
                }
            }
            Ok(Command::More) => {
                if !self.feed.fetch_more() {
                    println!("{}", view::NO_GENRE);
                }
            }
            Ok(Command::Playlist) => self.spawn_playlist(),
            Ok(Command::Status) => {
                println!(
                    "{}",
                    view::status(&self.feed.snapshot(), self.feed.card_state())
                );
            }
            Ok(Command::SignIn) => open_sign_in(&self.sign_in_url),
            Ok(Command::Help) => println!("{}", view::HELP),
            Ok(Command::Quit) => return Flow::Quit,
            Err(ParseCommandError::Empty) => {}
            Err(e) => println!("{e}. Type `help` for commands."),
        }
        Flow::Continue
    }

    fn spawn_playlist(&self) {
        println!("Creating playlist...");
        let backend = Arc::clone(&self.backend);
        let notice_tx = self.notice_tx.clone();
        tokio::spawn(async move {
            let notice = create_playlist(backend.as_ref()).await;
            let _ = notice_tx.send(notice);
        });
    }

    fn show_event(&mut self, event: &FeedEvent) {
        if let FeedEvent::Notice(notice) = event {
            self.show_notice(notice);
            return;
        }
        if let Some(text) = view::event(event, &self.feed.snapshot()) {
            println!("{text}");
        }
    }

    fn show_notice(&mut self, notice: &Notice) {
        println!("{}", view::notice(notice));
        if notice.requires_ack() {
            self.awaiting_ack = true;
        }
    }
}
