use serde::{Deserialize, Serialize};

/// A recommended song as returned by the backend.
///
/// Field names follow the backend's JSON (`name`, `artists`, `imageUrl`,
/// `previewUrl`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedItem {
    /// Opaque track identifier, also the payload of a "like"
    pub id: String,
    /// Display name of the song
    #[serde(rename = "name")]
    pub title: String,
    /// Performer display names, in billing order
    #[serde(rename = "artists", default)]
    pub performers: Vec<String>,
    /// Cover art image URL
    #[serde(rename = "imageUrl", default)]
    pub artwork_url: String,
    /// Short audio preview; `None` means the card has no playback
    #[serde(rename = "previewUrl", default)]
    pub preview_url: Option<String>,
}

impl RecommendedItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            performers: Vec::new(),
            artwork_url: String::new(),
            preview_url: None,
        }
    }

    #[must_use]
    pub fn with_performer(mut self, performer: impl Into<String>) -> Self {
        self.performers.push(performer.into());
        self
    }

    #[must_use]
    pub fn with_artwork(mut self, url: impl Into<String>) -> Self {
        self.artwork_url = url.into();
        self
    }

    #[must_use]
    pub fn with_preview(mut self, url: impl Into<String>) -> Self {
        self.preview_url = Some(url.into());
        self
    }

    /// Performers joined for display ("A, B")
    #[must_use]
    pub fn performers_display(&self) -> String {
        self.performers.join(", ")
    }

    /// The preview URL, ignoring blank values
    #[must_use]
    pub fn preview(&self) -> Option<&str> {
        self.preview_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
    }
}
