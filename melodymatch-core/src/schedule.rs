//! Cancellable scheduled tasks.
//!
//! A [`ScheduledTask`] owns a child [`CancellationToken`] through its
//! [`DropGuard`], so the task stops when the handle is dropped, replaced, or
//! when the parent token is cancelled. Holding the handle in an `Option` field
//! and assigning a new one cancels the old task before the new one runs.

use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Handle to a spawned timer task; cancels the task when dropped.
#[derive(Debug)]
pub struct ScheduledTask {
    _guard: DropGuard,
}

impl ScheduledTask {
    /// Run `action` once after `delay`, unless cancelled first.
    #[must_use]
    pub fn after<F, Fut>(delay: Duration, parent: &CancellationToken, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = parent.child_token();
        let task_token = token.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = task_token.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    action().await;
                }
            }
        });

        Self {
            _guard: token.drop_guard(),
        }
    }

    /// Run `action` every `period`, first after one full period, until cancelled.
    ///
    /// Ticks missed while `action` is running are delayed rather than bunched up.
    #[must_use]
    pub fn every<F, Fut>(period: Duration, parent: &CancellationToken, mut action: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = parent.child_token();
        let task_token = token.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = task_token.cancelled() => break,
                    _ = interval.tick() => {
                        action().await;
                    }
                }
            }
        });

        Self {
            _guard: token.drop_guard(),
        }
    }
}
