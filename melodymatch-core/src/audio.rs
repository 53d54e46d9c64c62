//! Single-slot preview playback.

use crate::item::RecommendedItem;
use tracing::{debug, info};

/// Something that can play one audio preview at a time.
pub trait PreviewPlayer: Send {
    /// Start playing the preview at `url`.
    fn play(&mut self, url: &str);

    /// Stop whatever is playing.
    fn stop(&mut self);
}

/// Player that only logs what would be played.
#[derive(Debug, Default)]
pub struct SilentPreview;

impl PreviewPlayer for SilentPreview {
    fn play(&mut self, url: &str) {
        info!("Preview available: {}", url);
    }

    fn stop(&mut self) {}
}

/// The one audio stream, owned by whichever card is displayed.
///
/// Swapping always stops the previous stream before starting the next, so two
/// previews never play at once.
pub struct AudioSlot {
    player: Box<dyn PreviewPlayer>,
    playing: Option<String>,
}

impl AudioSlot {
    #[must_use]
    pub fn new(player: Box<dyn PreviewPlayer>) -> Self {
        Self {
            player,
            playing: None,
        }
    }

    /// Hand the slot to `item`, or release it when no card is displayed.
    pub fn swap(&mut self, item: Option<&RecommendedItem>) {
        if self.playing.take().is_some() {
            self.player.stop();
        }

        if let Some(url) = item.and_then(RecommendedItem::preview) {
            debug!("Starting preview {}", url);
            self.player.play(url);
            self.playing = Some(url.to_string());
        }
    }

    /// Stop playback and release the slot.
    pub fn stop(&mut self) {
        self.swap(None);
    }

    /// URL of the preview currently playing
    #[must_use]
    pub fn playing(&self) -> Option<&str> {
        self.playing.as_deref()
    }
}

impl Drop for AudioSlot {
    fn drop(&mut self) {
        self.stop();
    }
}
