use crate::backend::Backend;
use crate::notice::Notice;
use tracing::{info, warn};

/// Ask the backend to build a playlist and turn the reply into a notice.
pub async fn create_playlist(backend: &dyn Backend) -> Notice {
    match backend.request_playlist_creation().await {
        Ok(message) => {
            info!("Playlist created: {}", message);
            Notice::PlaylistCreated(message)
        }
        Err(e) => {
            warn!("Error creating a playlist: {}", e);
            Notice::PlaylistFailed
        }
    }
}
