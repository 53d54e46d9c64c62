use crate::error::{CoreError, Result};
use const_format::concatcp;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Environment variable that overrides `backend.base_url` at deployment time
pub const BACKEND_URL_ENV: &str = "MELODYMATCH_BACKEND_URL";

/// Interval between periodic recommendation fetches (40 seconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 40_000;

/// Minimum listen time before a swipe is accepted (4.2 seconds)
pub const DEFAULT_DWELL_MS: u64 = 4_200;

/// Minimum time the "Authenticating..." state stays visible (1 second)
pub const DEFAULT_CHECKING_DELAY_MS: u64 = 1_000;

const DEFAULT_USER_AGENT: &str = concatcp!("MelodyMatch/", env!("CARGO_PKG_VERSION"));

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MelodyMatchConfig {
    pub backend: BackendConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the MelodyMatch backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL every endpoint is resolved against
    #[serde(default)]
    pub base_url: String,
    /// Whether session cookies are forwarded with every request
    #[serde(default)]
    pub credentials: CredentialMode,
    /// Optional session cookie (`name=value`) seeded into the cookie jar
    #[serde(default)]
    pub session_cookie: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl BackendConfig {
    /// Create a backend config for the given base URL with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credentials: CredentialMode::default(),
            session_cookie: None,
            user_agent: default_user_agent(),
        }
    }

    /// Parse the base URL, normalized to end with a slash so endpoint paths
    /// join beneath it instead of replacing its last segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not a valid absolute URL.
    pub fn base_url(&self) -> Result<Url> {
        let trimmed = self.base_url.trim();
        if trimmed.ends_with('/') {
            Ok(Url::parse(trimmed)?)
        } else {
            Ok(Url::parse(&format!("{trimmed}/"))?)
        }
    }
}

/// Credential-forwarding mode for backend requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredentialMode {
    /// Keep a cookie jar and send session cookies with every request
    #[default]
    Include,
    /// Never store or send cookies
    Omit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_dwell")]
    pub dwell_ms: u64,
}

const fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

const fn default_dwell() -> u64 {
    DEFAULT_DWELL_MS
}

impl FeedConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            dwell_ms: default_dwell(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_checking_delay")]
    pub checking_delay_ms: u64,
}

const fn default_checking_delay() -> u64 {
    DEFAULT_CHECKING_DELAY_MS
}

impl SessionConfig {
    #[must_use]
    pub const fn checking_delay(&self) -> Duration {
        Duration::from_millis(self.checking_delay_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            checking_delay_ms: default_checking_delay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub player: PlayerKind,
    #[serde(default = "default_mpv_path")]
    pub mpv_path: String,
}

fn default_mpv_path() -> String {
    "mpv".to_string()
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            player: PlayerKind::default(),
            mpv_path: default_mpv_path(),
        }
    }
}

/// Which preview player the front end drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    /// Log preview URLs without playing them
    #[default]
    None,
    /// Play previews through an external `mpv` process
    Mpv,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enabled: bool,
}

impl MelodyMatchConfig {
    /// Get the configuration directory path (~/.config/melodymatch/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/melodymatch/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from file or create template on first run.
    ///
    /// The `MELODYMATCH_BACKEND_URL` environment variable, when set, takes
    /// precedence over `backend.base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read, parsed, or if required fields are missing.
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(&config_path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound { path: config_path });
        }

        let content = fs::read_to_string(&config_path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parse a config from TOML text without validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this structure.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply deployment-time overrides looked up through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.backend.base_url = url;
        }
    }

    /// Validate that required fields are present and intervals are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is missing or malformed, or an interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(CoreError::ConfigMissingField {
                field: "backend.base_url".into(),
            });
        }
        let url = self.backend.base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::ConfigInvalid {
                message: format!("backend.base_url must be http or https, got {}", url.scheme()),
            });
        }
        if self.feed.poll_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "feed.poll_interval_ms must be greater than zero".into(),
            });
        }
        if self.feed.dwell_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "feed.dwell_ms must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

/// Template written on first run
pub const CONFIG_TEMPLATE: &str = concatcp!(
    r#"# MelodyMatch Configuration
# ~/.config/melodymatch/config.toml

[backend]
# Required: base URL of the MelodyMatch backend
# Can be overridden with the MELODYMATCH_BACKEND_URL environment variable
base_url = ""
# "include" forwards session cookies with every request, "omit" never does
credentials = "include"
# Optional: session cookie obtained after signing in, as name=value
# session_cookie = ""

[feed]
# How often more recommendations are fetched for the active genre
poll_interval_ms = "#,
    DEFAULT_POLL_INTERVAL_MS,
    r#"
# Minimum listen time before a swipe is accepted
dwell_ms = "#,
    DEFAULT_DWELL_MS,
    r#"

[session]
checking_delay_ms = "#,
    DEFAULT_CHECKING_DELAY_MS,
    r#"

[audio]
# "none" only logs preview URLs, "mpv" plays them with an external mpv process
player = "none"
mpv_path = "mpv"

[logging]
# Also write logs to ~/.config/melodymatch/melodymatch.log
enabled = false
"#
);
