//! Recommendation feed: the item queue, the cursor and the polling loop.

use crate::audio::{AudioSlot, PreviewPlayer};
use crate::backend::Backend;
use crate::config::FeedConfig;
use crate::error::CoreError;
use crate::event::FeedEvent;
use crate::gate::PlaybackGate;
use crate::item::RecommendedItem;
use crate::schedule::ScheduledTask;
use crate::swipe::CardState;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Timing settings for the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedSettings {
    /// Interval between periodic fetches for the active genre
    pub poll_interval: Duration,
    /// Minimum time a card is displayed before it can be swiped
    pub dwell: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self::from(&FeedConfig::default())
    }
}

impl From<&FeedConfig> for FeedSettings {
    fn from(config: &FeedConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            dwell: config.dwell(),
        }
    }
}

/// Snapshot of the feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedState {
    /// Every item fetched for the active genre, in arrival order
    pub items: Vec<RecommendedItem>,
    /// Index of the displayed card; equals `items.len()` when exhausted
    pub cursor: usize,
    /// Genre driving the feed; empty when no feed is active
    pub active_genre: String,
    /// Whether a fetch for the active genre is outstanding
    pub fetch_in_flight: bool,
}

impl FeedState {
    /// The card at the cursor, if any
    #[must_use]
    pub fn current(&self) -> Option<&RecommendedItem> {
        self.items.get(self.cursor)
    }

    /// Whether every fetched item has been swiped
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.items.len()
    }

    /// Number of cards left, including the displayed one
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.cursor)
    }
}

/// Identifies the genre generation a fetch was issued under.
///
/// Completions carrying a ticket from an older generation are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    genre: String,
}

impl FetchTicket {
    /// Genre the fetch was issued for
    #[must_use]
    pub fn genre(&self) -> &str {
        &self.genre
    }
}

/// Result of trying to swipe the displayed card away
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    NoCard,
    Rejected { cursor: usize },
    Resolved { item: RecommendedItem, cursor: usize },
}

struct FeedInner {
    state: FeedState,
    generation: u64,
    in_flight: usize,
    poll: Option<ScheduledTask>,
    audio: AudioSlot,
}

/// Owns the recommendation queue and coordinates fetching, the playback gate
/// and the preview audio slot.
pub struct FeedController {
    backend: Arc<dyn Backend>,
    settings: FeedSettings,
    inner: Mutex<FeedInner>,
    gate: PlaybackGate,
    event_tx: broadcast::Sender<FeedEvent>,
    cancel_token: CancellationToken,
}

impl FeedController {
    /// Create a new feed controller
    ///
    /// # Arguments
    /// * `backend` - Backend that serves recommendations
    /// * `settings` - Poll and dwell intervals
    /// * `player` - Preview player owned by the audio slot
    /// * `cancel_token` - Optional parent token; cancelling it tears the feed down
    pub fn new(
        backend: Arc<dyn Backend>,
        settings: FeedSettings,
        player: Box<dyn PreviewPlayer>,
        cancel_token: Option<&CancellationToken>,
    ) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(128);
        let cancel_token = cancel_token.map_or_else(CancellationToken::new, CancellationToken::child_token);
        let gate = PlaybackGate::new(settings.dwell, event_tx.clone(), cancel_token.clone());

        Arc::new(Self {
            backend,
            settings,
            inner: Mutex::new(FeedInner {
                state: FeedState::default(),
                generation: 0,
                in_flight: 0,
                poll: None,
                audio: AudioSlot::new(player),
            }),
            gate,
            event_tx,
            cancel_token,
        })
    }

    /// Subscribe to feed events
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.event_tx.subscribe()
    }

    /// Get a clone of the cancellation token
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    #[must_use]
    pub const fn settings(&self) -> FeedSettings {
        self.settings
    }

    /// Backend the feed fetches from
    #[must_use]
    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    /// Playback gate guarding the displayed card
    #[must_use]
    pub const fn gate(&self) -> &PlaybackGate {
        &self.gate
    }

    /// Switch the feed to `genre`.
    ///
    /// Clears the items and resets the cursor before anything else, stops the
    /// previous polling loop, then issues one fetch right away and polls every
    /// `poll_interval` under the new genre. An empty genre leaves the feed
    /// inactive.
    pub fn set_genre(self: &Arc<Self>, genre: &str) {
        let genre = genre.trim().to_string();
        let mut inner = self.lock();

        inner.poll = None;
        inner.generation += 1;
        inner.in_flight = 0;
        inner.state.fetch_in_flight = false;
        inner.state.items.clear();
        inner.state.cursor = 0;
        inner.state.active_genre.clone_from(&genre);

        self.emit(FeedEvent::FeedReset {
            genre: genre.clone(),
        });
        self.show_current(&mut inner);

        if genre.is_empty() {
            info!("Feed cleared, no genre active");
            return;
        }
        if self.cancel_token.is_cancelled() {
            debug!("Feed is shut down, not fetching for {}", genre);
            return;
        }

        info!(
            "Feed switched to genre {:?} (polling every {:?})",
            genre, self.settings.poll_interval
        );

        let generation = inner.generation;
        let weak = Arc::downgrade(self);
        inner.poll = Some(ScheduledTask::every(
            self.settings.poll_interval,
            &self.cancel_token,
            move || {
                let weak = weak.clone();
                async move {
                    if let Some(feed) = weak.upgrade() {
                        feed.poll_tick(generation);
                    }
                }
            },
        ));

        let ticket = Self::begin_fetch(&mut inner);
        drop(inner);
        self.spawn_fetch(ticket);
    }

    /// Fetch more items for the active genre right away.
    ///
    /// Returns `false` when no genre is active.
    pub fn fetch_more(self: &Arc<Self>) -> bool {
        let mut inner = self.lock();
        if inner.state.active_genre.is_empty() || self.cancel_token.is_cancelled() {
            return false;
        }
        let ticket = Self::begin_fetch(&mut inner);
        drop(inner);
        self.spawn_fetch(ticket);
        true
    }

    fn poll_tick(self: &Arc<Self>, generation: u64) {
        let mut inner = self.lock();
        if inner.generation != generation || inner.state.active_genre.is_empty() {
            return;
        }
        if inner.in_flight > 0 {
            debug!(
                "Skipping periodic fetch for {}: {} fetch(es) still in flight",
                inner.state.active_genre, inner.in_flight
            );
            return;
        }
        let ticket = Self::begin_fetch(&mut inner);
        drop(inner);
        self.spawn_fetch(ticket);
    }

    fn begin_fetch(inner: &mut FeedInner) -> FetchTicket {
        inner.in_flight += 1;
        inner.state.fetch_in_flight = true;
        FetchTicket {
            generation: inner.generation,
            genre: inner.state.active_genre.clone(),
        }
    }

    fn spawn_fetch(self: &Arc<Self>, ticket: FetchTicket) {
        self.emit(FeedEvent::FetchStarted {
            genre: ticket.genre.clone(),
        });

        let feed = Arc::clone(self);
        let cancel_token = self.cancel_token.clone();
        tokio::spawn(async move {
            let genre = ticket.genre.clone();
            tokio::select! {
                () = cancel_token.cancelled() => {
                    debug!("Fetch for {} cancelled by shutdown", genre);
                }
                result = feed.backend.fetch_recommendations(&genre) => {
                    feed.on_fetch_complete(ticket, result);
                }
            }
        });
    }

    /// Apply the outcome of a fetch.
    ///
    /// Items are appended in arrival order without reordering or deduplication.
    /// A failure leaves the items untouched and raises a
    /// [`Notice::FetchFailed`](crate::Notice::FetchFailed); polling carries on.
    /// Completions for a genre that is no longer active, or after shutdown, are
    /// dropped.
    pub fn on_fetch_complete(
        &self,
        ticket: FetchTicket,
        result: Result<Vec<RecommendedItem>, CoreError>,
    ) {
        let mut inner = self.lock();

        if ticket.generation != inner.generation || self.cancel_token.is_cancelled() {
            debug!("Discarding stale fetch result for {}", ticket.genre);
            self.emit(FeedEvent::FetchDiscarded {
                genre: ticket.genre,
            });
            return;
        }

        inner.in_flight = inner.in_flight.saturating_sub(1);
        inner.state.fetch_in_flight = inner.in_flight > 0;

        match result {
            Ok(new_items) => {
                let was_exhausted = inner.state.is_exhausted();
                let added = new_items.len();
                inner.state.items.extend(new_items);
                let total = inner.state.items.len();

                info!(
                    "Fetched {} recommendations for {} ({} total)",
                    added, ticket.genre, total
                );
                self.emit(FeedEvent::ItemsAppended { added, total });

                if was_exhausted && !inner.state.is_exhausted() {
                    self.show_current(&mut inner);
                }
            }
            Err(e) => {
                warn!("Failed to fetch recommendations for {}: {}", ticket.genre, e);
                self.emit(FeedEvent::Notice(crate::Notice::FetchFailed));
            }
        }
    }

    /// Swipe the displayed card away if the playback gate allows it.
    pub(crate) fn resolve_current(&self, liked: bool) -> Resolution {
        let mut inner = self.lock();

        let cursor = inner.state.cursor;
        let Some(item) = inner.state.current().cloned() else {
            return Resolution::NoCard;
        };

        if self.gate.attempt_advance().is_err() {
            return Resolution::Rejected { cursor };
        }

        inner.state.cursor = cursor + 1;
        self.emit(FeedEvent::Advanced {
            cursor: cursor + 1,
            liked,
        });
        self.show_current(&mut inner);

        Resolution::Resolved {
            item,
            cursor: cursor + 1,
        }
    }

    /// Point the gate and the audio slot at whatever card is now displayed.
    fn show_current(&self, inner: &mut FeedInner) {
        let FeedInner { state, audio, .. } = inner;
        let cursor = state.cursor;

        if let Some(item) = state.items.get(cursor) {
            self.gate.rearm(cursor);
            audio.swap(Some(item));
            self.emit(FeedEvent::CardShown {
                cursor,
                item: item.clone(),
            });
        } else {
            self.gate.disarm();
            audio.stop();
            self.emit(FeedEvent::Exhausted);
        }
    }

    /// Get a snapshot of the feed
    #[must_use]
    pub fn snapshot(&self) -> FeedState {
        self.lock().state.clone()
    }

    /// Card at the cursor, if any
    #[must_use]
    pub fn current_item(&self) -> Option<RecommendedItem> {
        self.lock().state.current().cloned()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.lock().state.cursor
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.lock().state.is_exhausted()
    }

    #[must_use]
    pub fn fetch_in_flight(&self) -> bool {
        self.lock().state.fetch_in_flight
    }

    #[must_use]
    pub fn active_genre(&self) -> String {
        self.lock().state.active_genre.clone()
    }

    /// Whether the dwell interval has elapsed for the displayed card
    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.gate.can_advance()
    }

    /// Swipe state of the displayed card, or `None` when the feed is exhausted
    #[must_use]
    pub fn card_state(&self) -> Option<CardState> {
        let inner = self.lock();
        inner.state.current()?;
        Some(if self.gate.can_advance() {
            CardState::Eligible
        } else {
            CardState::Pending
        })
    }

    /// URL of the preview currently playing
    #[must_use]
    pub fn playing_preview(&self) -> Option<String> {
        self.lock().audio.playing().map(str::to_string)
    }

    /// Tear the feed down: stop polling, drop outstanding fetches, close the
    /// gate and release the audio slot.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();

        let mut inner = self.lock();
        inner.poll = None;
        inner.generation += 1;
        inner.in_flight = 0;
        inner.state.fetch_in_flight = false;
        inner.audio.stop();
        self.gate.disarm();

        info!("Feed controller shut down");
    }

    pub(crate) fn emit(&self, event: FeedEvent) {
        let _ = self.event_tx.send(event);
    }

    fn lock(&self) -> MutexGuard<'_, FeedInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
