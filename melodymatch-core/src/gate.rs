//! Dwell-time gate that decides whether the displayed card may be swiped.

use crate::event::FeedEvent;
use crate::notice::Notice;
use crate::schedule::ScheduledTask;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct GateInner {
    can_advance: bool,
    /// Bumped on every re-arm so a late timer cannot open the gate for a newer card
    epoch: u64,
    timer: Option<ScheduledTask>,
}

/// Timer-driven eligibility flag for the card at the cursor.
///
/// Every re-arm closes the gate, cancels the pending dwell timer and starts a
/// fresh one, so at most one dwell timer is pending at any time.
pub struct PlaybackGate {
    dwell: Duration,
    inner: Arc<Mutex<GateInner>>,
    event_tx: broadcast::Sender<FeedEvent>,
    cancel_token: CancellationToken,
}

impl PlaybackGate {
    pub fn new(
        dwell: Duration,
        event_tx: broadcast::Sender<FeedEvent>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            dwell,
            inner: Arc::new(Mutex::new(GateInner {
                can_advance: false,
                epoch: 0,
                timer: None,
            })),
            event_tx,
            cancel_token,
        }
    }

    /// Dwell interval a card must be displayed before it can be swiped
    #[must_use]
    pub const fn dwell(&self) -> Duration {
        self.dwell
    }

    /// Close the gate and restart the dwell timer for the card at `cursor`.
    pub fn rearm(&self, cursor: usize) {
        let mut inner = lock(&self.inner);
        inner.epoch += 1;
        inner.can_advance = false;
        // Cancel the previous timer before the next one is spawned
        inner.timer = None;

        let epoch = inner.epoch;
        let shared = Arc::clone(&self.inner);
        let event_tx = self.event_tx.clone();
        inner.timer = Some(ScheduledTask::after(
            self.dwell,
            &self.cancel_token,
            move || async move {
                let mut inner = lock(&shared);
                if inner.epoch == epoch {
                    inner.can_advance = true;
                    debug!("Dwell elapsed for card {}", cursor);
                    let _ = event_tx.send(FeedEvent::SwipeEligible { cursor });
                }
            },
        ));
        debug!("Dwell timer armed for card {} ({:?})", cursor, self.dwell);
    }

    /// Close the gate with no timer pending (no card displayed).
    pub fn disarm(&self) {
        let mut inner = lock(&self.inner);
        inner.epoch += 1;
        inner.can_advance = false;
        inner.timer = None;
    }

    /// Whether the dwell interval has elapsed for the displayed card
    #[must_use]
    pub fn can_advance(&self) -> bool {
        lock(&self.inner).can_advance
    }

    /// Check whether a swipe may complete.
    ///
    /// # Errors
    ///
    /// Returns [`Notice::ListenLonger`] while the dwell interval has not elapsed;
    /// the caller must put the card back.
    pub fn attempt_advance(&self) -> Result<(), Notice> {
        if self.can_advance() {
            Ok(())
        } else {
            Err(Notice::ListenLonger)
        }
    }
}

impl Drop for PlaybackGate {
    fn drop(&mut self) {
        self.disarm();
    }
}

fn lock(inner: &Mutex<GateInner>) -> MutexGuard<'_, GateInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}
