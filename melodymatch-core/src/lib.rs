pub mod audio;
pub mod backend;
pub mod config;
pub mod error;
pub mod event;
pub mod feed;
pub mod gate;
pub mod item;
pub mod notice;
pub mod paths;
pub mod playlist;
pub mod schedule;
pub mod session;
pub mod swipe;

#[cfg(test)]
mod test_support;

pub use audio::{AudioSlot, PreviewPlayer, SilentPreview};
pub use backend::Backend;
pub use config::{
    AudioConfig, BackendConfig, CONFIG_TEMPLATE, CredentialMode, FeedConfig, LoggingConfig,
    MelodyMatchConfig, PlayerKind, SessionConfig,
};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use error::CoreError;
pub use event::FeedEvent;
pub use feed::{FeedController, FeedSettings, FeedState, FetchTicket};
pub use gate::PlaybackGate;
pub use item::RecommendedItem;
pub use notice::Notice;
pub use paths::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, LOG_FILE_NAME, config_dir, log_file_path};
pub use playlist::create_playlist;
pub use schedule::ScheduledTask;
pub use session::{SessionGate, SessionStatus};
pub use swipe::{CardState, ParseDirectionError, SwipeDirection, SwipeHandler, SwipeOutcome};
