//! Plain-text rendering of the feed for the terminal.

use melodymatch_core::{CardState, FeedEvent, FeedState, Notice, RecommendedItem};

pub const APP_NAME: &str = "MelodyMatch";

pub const CHECKING: &str = "Authenticating...";

pub const NO_CARD: &str = "There is no song to swipe on.";

pub const NO_GENRE: &str = "Pick a genre first with `genre <name>`.";

pub const HELP: &str = "\
Commands:
  genre <name>        switch to a genre (an empty name clears the feed)
  right | like | r    add the song to your liked songs and move on
  left | skip | l     skip the song
  up | down           skip the song
  more                load more songs for the current genre now
  playlist            create a playlist from your liked songs
  status              show where you are in the feed
  signin              open the sign-in page in your browser
  help                show this help
  quit                exit";

#[must_use]
pub fn landing() -> String {
    format!("Introducing {APP_NAME}\nFinding songs you like has never been easier\n")
}

#[must_use]
pub fn not_logged_in(sign_in_url: &str) -> String {
    format!(
        "You're not logged in.\n\
        Type `signin` to return to login ({sign_in_url}), or `quit` to exit."
    )
}

#[must_use]
pub fn card(cursor: usize, total: usize, item: &RecommendedItem) -> String {
    let mut text = format!(
        "[{}/{}] {}\n  by {}\n  artwork: {}",
        cursor + 1,
        total,
        item.title,
        item.performers_display(),
        item.artwork_url
    );
    match item.preview() {
        Some(url) => text.push_str(&format!("\n  preview: {url}")),
        None => text.push_str("\n  preview: not available"),
    }
    text
}

#[must_use]
pub fn exhausted() -> String {
    "You are seeing this because of one of these reasons:\n\
    \x20 1. You haven't generated any songs\n\
    \x20 2. Songs are still loading\n\
    \x20 3. You hit your limit of 600 songs"
        .to_string()
}

#[must_use]
pub fn notice(notice: &Notice) -> String {
    if notice.requires_ack() {
        format!("! {notice}\n  (press Enter to continue)")
    } else {
        format!("! {notice}")
    }
}

#[must_use]
pub fn status(state: &FeedState, card_state: Option<CardState>) -> String {
    if state.active_genre.is_empty() {
        return NO_GENRE.to_string();
    }
    let mut text = format!(
        "Genre: {}\nSong {} of {} ({} left)",
        state.active_genre,
        (state.cursor + 1).min(state.items.len()),
        state.items.len(),
        state.remaining()
    );
    if state.fetch_in_flight {
        text.push_str("\nLoading more songs...");
    }
    match card_state {
        Some(CardState::Pending) => text.push_str("\nKeep listening before you swipe."),
        Some(CardState::Eligible) => text.push_str("\nReady to swipe."),
        None => {}
    }
    text
}

/// Text for a feed event, if it is worth showing
#[must_use]
pub fn event(event: &FeedEvent, state: &FeedState) -> Option<String> {
    match event {
        FeedEvent::FeedReset { genre } if genre.is_empty() => Some("Feed cleared.".to_string()),
        FeedEvent::FeedReset { genre } => Some(format!("Genre set to {genre}.")),
        FeedEvent::FetchStarted { genre } => Some(format!("Loading {genre} songs...")),
        FeedEvent::ItemsAppended { added, total } => {
            Some(format!("Loaded {added} songs ({total} in the feed)."))
        }
        FeedEvent::CardShown { cursor, item } => Some(card(*cursor, state.items.len(), item)),
        FeedEvent::SwipeEligible { .. } => Some("You can swipe now.".to_string()),
        FeedEvent::Advanced { liked: true, .. } => Some("Liked.".to_string()),
        FeedEvent::Advanced { liked: false, .. } => Some("Skipped.".to_string()),
        FeedEvent::Exhausted => Some(exhausted()),
        FeedEvent::Notice(n) => Some(notice(n)),
        FeedEvent::FetchDiscarded { .. } | FeedEvent::SwipeRejected { .. } => None,
    }
}
