//! One-shot session check that gates the feed.

use crate::backend::Backend;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OnceCell, watch};
use tracing::{info, warn};

/// Where the session check stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Probe still running (or inside the minimum display delay)
    Checking,
    Authenticated,
    Unauthenticated,
}

impl SessionStatus {
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Probes the backend session exactly once.
///
/// A failed probe, whether a non-success status or a network error, resolves
/// to [`SessionStatus::Unauthenticated`] and is never retried.
pub struct SessionGate {
    backend: Arc<dyn Backend>,
    checking_delay: Duration,
    status_tx: watch::Sender<SessionStatus>,
    resolved: OnceCell<SessionStatus>,
}

impl SessionGate {
    /// Create a session gate
    ///
    /// # Arguments
    /// * `backend` - Backend to probe
    /// * `checking_delay` - Extra time the checking state stays visible after the probe
    pub fn new(backend: Arc<dyn Backend>, checking_delay: Duration) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Checking);
        Self {
            backend,
            checking_delay,
            status_tx,
            resolved: OnceCell::new(),
        }
    }

    /// Subscribe to status changes
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        *self.status_tx.borrow()
    }

    /// Run the probe if it has not run yet and return the terminal status.
    ///
    /// Later calls return the first result without contacting the backend.
    pub async fn resolve(&self) -> SessionStatus {
        *self.resolved.get_or_init(|| self.probe_once()).await
    }

    async fn probe_once(&self) -> SessionStatus {
        info!("Checking session with {} backend", self.backend.name());

        let authenticated = match self.backend.probe_session().await {
            Ok(true) => true,
            Ok(false) => {
                info!("Backend rejected the session");
                false
            }
            Err(e) => {
                warn!("Session probe failed: {}", e);
                false
            }
        };

        tokio::time::sleep(self.checking_delay).await;

        let status = if authenticated {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Unauthenticated
        };
        info!("Session resolved: {:?}", status);
        self.status_tx.send_replace(status);
        status
    }
}
