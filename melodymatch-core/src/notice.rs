//! User-visible notices raised by the feed and its actions.

/// A message the presentation layer shows to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A swipe came in before the dwell interval elapsed
    ListenLonger,
    /// Fetching recommendations failed
    FetchFailed,
    /// The backend created the playlist and replied with this message
    PlaylistCreated(String),
    /// Playlist creation failed
    PlaylistFailed,
}

impl Notice {
    /// Text shown to the user
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::ListenLonger => {
                "Please listen to each song for at least 4 seconds to prevent misuse on the backend."
            }
            Self::FetchFailed => "Error getting songs",
            Self::PlaylistCreated(message) => message,
            Self::PlaylistFailed => "Failed to Create Playlist",
        }
    }

    /// Whether the notice blocks until the user acknowledges it
    #[must_use]
    pub const fn requires_ack(&self) -> bool {
        !matches!(self, Self::ListenLonger)
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
