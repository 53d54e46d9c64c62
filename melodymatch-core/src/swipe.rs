//! Swipe outcome handling for the card at the cursor.
//!
//! A card moves through [`CardState::Pending`] (dwell not yet satisfied),
//! [`CardState::Eligible`] and finally `Resolved` once it is swiped away. Only
//! the card at the cursor can be swiped.

use crate::backend::Backend;
use crate::event::FeedEvent;
use crate::feed::{FeedController, Resolution};
use crate::item::RecommendedItem;
use crate::notice::Notice;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Swipe state of the displayed card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    /// Card shown, dwell interval still running
    Pending,
    /// Dwell interval elapsed, the card can be swiped
    Eligible,
}

/// Direction a swipe gesture completed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Right,
    Left,
    Up,
    Down,
}

impl SwipeDirection {
    /// Only a right swipe accepts (likes) the card
    #[must_use]
    pub const fn is_accept(self) -> bool {
        matches!(self, Self::Right)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Left => "left",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl std::fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized swipe direction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown swipe direction: {0}")]
pub struct ParseDirectionError(String);

impl FromStr for SwipeDirection {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "right" | "r" | "like" | "accept" => Ok(Self::Right),
            "left" | "l" | "skip" | "decline" => Ok(Self::Left),
            "up" | "u" => Ok(Self::Up),
            "down" | "d" => Ok(Self::Down),
            other => Err(ParseDirectionError(other.to_string())),
        }
    }
}

/// What happened to a swipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwipeOutcome {
    /// Nothing is displayed; the feed is exhausted
    NoCard,
    /// The dwell interval had not elapsed; the card must be put back
    Rejected,
    /// The card was swiped away and the cursor advanced to `cursor`
    Resolved {
        item: RecommendedItem,
        liked: bool,
        cursor: usize,
    },
}

/// Interprets completed swipe gestures for a feed.
pub struct SwipeHandler {
    feed: Arc<FeedController>,
    backend: Arc<dyn Backend>,
}

impl SwipeHandler {
    #[must_use]
    pub fn new(feed: Arc<FeedController>) -> Self {
        let backend = feed.backend();
        Self { feed, backend }
    }

    /// Feed this handler swipes on
    #[must_use]
    pub const fn feed(&self) -> &Arc<FeedController> {
        &self.feed
    }

    /// Called when a gesture crosses the swipe threshold.
    ///
    /// Returns `false` (and raises [`Notice::ListenLonger`]) when the dwell
    /// interval has not elapsed; the presentation layer must restore the card.
    pub fn on_swipe_attempt(&self) -> bool {
        if self.feed.current_item().is_none() {
            return false;
        }
        match self.feed.gate().attempt_advance() {
            Ok(()) => true,
            Err(notice) => {
                let cursor = self.feed.cursor();
                debug!("Swipe attempt on card {} before dwell elapsed", cursor);
                self.feed.emit(FeedEvent::SwipeRejected { cursor });
                self.feed.emit(FeedEvent::Notice(notice));
                false
            }
        }
    }

    /// Resolve a completed swipe on the displayed card.
    ///
    /// An accepted (right) swipe fires one like for the card without waiting
    /// for it; a failed like is logged and never rolls the cursor back. Any
    /// other direction just skips the card. A swipe that arrives before the
    /// dwell interval elapsed changes nothing.
    pub fn on_swipe(&self, direction: SwipeDirection) -> SwipeOutcome {
        let liked = direction.is_accept();

        match self.feed.resolve_current(liked) {
            Resolution::NoCard => {
                debug!("Swipe {} with no card displayed", direction);
                SwipeOutcome::NoCard
            }
            Resolution::Rejected { cursor } => {
                self.feed.emit(FeedEvent::SwipeRejected { cursor });
                self.feed.emit(FeedEvent::Notice(Notice::ListenLonger));
                SwipeOutcome::Rejected
            }
            Resolution::Resolved { item, cursor } => {
                if liked {
                    info!("Liked {} - {}", item.performers_display(), item.title);
                    self.spawn_like(item.id.clone());
                } else {
                    debug!("Skipped {} ({})", item.title, direction);
                }
                SwipeOutcome::Resolved {
                    item,
                    liked,
                    cursor,
                }
            }
        }
    }

    fn spawn_like(&self, id: String) {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            if let Err(e) = backend.like_item(&id).await {
                warn!("Failed to add {} to liked songs: {}", id, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentPreview;
    use crate::feed::FeedSettings;
    use crate::test_support::{MockBackend, Reply, items, settle};
    use std::time::Duration;
    use tokio::sync::broadcast;

    async fn ready_feed(backend: &Arc<MockBackend>, count: usize) -> SwipeHandler {
        backend.push_reply(Reply::items(items("pop", count)));
        let feed = FeedController::new(
            backend.clone(),
            FeedSettings::default(),
            Box::new(SilentPreview),
            None,
        );
        feed.set_genre("pop");
        settle().await;
        SwipeHandler::new(feed)
    }

    fn notices(rx: &mut broadcast::Receiver<FeedEvent>) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let FeedEvent::Notice(notice) = event {
                notices.push(notice);
            }
        }
        notices
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!("right".parse(), Ok(SwipeDirection::Right));
        assert_eq!("LIKE".parse(), Ok(SwipeDirection::Right));
        assert_eq!(" skip ".parse(), Ok(SwipeDirection::Left));
        assert_eq!("u".parse(), Ok(SwipeDirection::Up));
        assert_eq!("down".parse(), Ok(SwipeDirection::Down));
        assert!("sideways".parse::<SwipeDirection>().is_err());
    }

    #[test]
    fn test_only_right_accepts() {
        assert!(SwipeDirection::Right.is_accept());
        assert!(!SwipeDirection::Left.is_accept());
        assert!(!SwipeDirection::Up.is_accept());
        assert!(!SwipeDirection::Down.is_accept());
    }

    #[tokio::test(start_paused = true)]
    async fn test_accept_before_dwell_is_rejected() {
        let backend = MockBackend::new();
        let handler = ready_feed(&backend, 3).await;
        let mut rx = handler.feed().subscribe();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!handler.on_swipe_attempt());
        assert_eq!(handler.on_swipe(SwipeDirection::Right), SwipeOutcome::Rejected);
        settle().await;

        assert_eq!(handler.feed().cursor(), 0);
        assert!(backend.likes().is_empty());
        assert_eq!(notices(&mut rx), vec![Notice::ListenLonger, Notice::ListenLonger]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accept_after_dwell_likes_once() {
        let backend = MockBackend::new();
        let handler = ready_feed(&backend, 3).await;

        tokio::time::sleep(Duration::from_millis(4200)).await;
        settle().await;
        assert!(handler.on_swipe_attempt());

        let outcome = handler.on_swipe(SwipeDirection::Right);
        settle().await;

        assert!(matches!(
            outcome,
            SwipeOutcome::Resolved { ref item, liked: true, cursor: 1 } if item.id == "pop-0"
        ));
        assert_eq!(backend.likes(), vec!["pop-0"]);
        assert_eq!(handler.feed().cursor(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decline_after_dwell_skips_without_like() {
        let backend = MockBackend::new();
        let handler = ready_feed(&backend, 3).await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        let outcome = handler.on_swipe(SwipeDirection::Left);
        settle().await;

        assert!(matches!(outcome, SwipeOutcome::Resolved { liked: false, cursor: 1, .. }));
        assert!(backend.likes().is_empty());
        assert_eq!(handler.feed().cursor(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_swipe_needs_fresh_dwell() {
        let backend = MockBackend::new();
        let handler = ready_feed(&backend, 3).await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        handler.on_swipe(SwipeDirection::Right);
        assert_eq!(handler.on_swipe(SwipeDirection::Right), SwipeOutcome::Rejected);
        settle().await;

        assert_eq!(backend.likes(), vec!["pop-0"]);
        assert_eq!(handler.feed().cursor(), 1);
        assert_eq!(handler.feed().card_state(), Some(CardState::Pending));
    }

    #[tokio::test(start_paused = true)]
    async fn test_like_failure_does_not_roll_back() {
        let backend = MockBackend::new();
        backend.fail_likes();
        let handler = ready_feed(&backend, 2).await;
        let mut rx = handler.feed().subscribe();

        tokio::time::sleep(Duration::from_secs(5)).await;
        handler.on_swipe(SwipeDirection::Right);
        settle().await;

        assert_eq!(backend.likes(), vec!["pop-0"]);
        assert_eq!(handler.feed().cursor(), 1);
        assert!(notices(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cursor_stops_at_end() {
        let backend = MockBackend::new();
        let handler = ready_feed(&backend, 1).await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        handler.on_swipe(SwipeDirection::Down);
        assert!(handler.feed().is_exhausted());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handler.on_swipe(SwipeDirection::Right), SwipeOutcome::NoCard);
        assert!(!handler.on_swipe_attempt());

        let state = handler.feed().snapshot();
        assert_eq!(state.cursor, state.items.len());
        assert_eq!(handler.feed().current_item(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pop_feed_end_to_end() {
        let backend = MockBackend::new();
        let handler = ready_feed(&backend, 20).await;
        let feed = handler.feed().clone();

        assert_eq!(feed.snapshot().items.len(), 20);
        assert_eq!(feed.cursor(), 0);
        assert_eq!(feed.card_state(), Some(CardState::Pending));

        tokio::time::sleep(Duration::from_millis(4201)).await;
        assert_eq!(feed.card_state(), Some(CardState::Eligible));

        handler.on_swipe(SwipeDirection::Right);
        settle().await;

        assert_eq!(backend.likes(), vec!["pop-0"]);
        assert_eq!(feed.cursor(), 1);
        assert_eq!(feed.current_item().map(|i| i.id), Some("pop-1".to_string()));
        assert_eq!(feed.card_state(), Some(CardState::Pending));
        assert_eq!(
            feed.playing_preview().as_deref(),
            Some("https://p.example/pop-1.mp3")
        );

        tokio::time::sleep(Duration::from_millis(4201)).await;
        assert_eq!(feed.card_state(), Some(CardState::Eligible));
    }
}
