use crate::error::CoreError;
use crate::item::RecommendedItem;
use async_trait::async_trait;

/// Trait for the remote service that owns sessions, recommendations and playlists.
///
/// Implementations forward the user's session credentials on every call. They
/// report transport and status failures as errors; deciding which failures
/// reach the user is left to the controllers.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the backend name (for logging)
    fn name(&self) -> &'static str;

    /// Check whether the forwarded session is authenticated.
    ///
    /// Returns `Ok(false)` when the backend answers with a non-success status.
    async fn probe_session(&self) -> Result<bool, CoreError>;

    /// Fetch a batch of recommendations for a genre.
    async fn fetch_recommendations(&self, genre: &str) -> Result<Vec<RecommendedItem>, CoreError>;

    /// Add a track to the user's liked playlist.
    async fn like_item(&self, id: &str) -> Result<(), CoreError>;

    /// Ask the backend to build a playlist from the liked tracks.
    ///
    /// Returns the backend's human-readable reply.
    async fn request_playlist_creation(&self) -> Result<String, CoreError>;
}
