mod app;
mod command;
mod player;
mod view;

use melodymatch_core::{CoreError, MelodyMatchConfig, TomlParseError};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    let config = match MelodyMatchConfig::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            show_new_config_message(&path);
            std::process::exit(0);
        }
        Err(CoreError::ConfigParseError(parse_error)) => {
            show_config_parse_error(&parse_error, &MelodyMatchConfig::config_path());
            std::process::exit(1);
        }
        Err(e @ (CoreError::ConfigMissingField { .. } | CoreError::ConfigInvalid { .. })) => {
            show_config_error(&e, &MelodyMatchConfig::config_path());
            std::process::exit(1);
        }
        Err(e) => {
            error!("{e}");
            eprintln!("An unexpected error occurred: {e}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    info!("Using backend at {}", config.backend.base_url);
    let result = runtime.block_on(app::run(&config, &cancel_token));
    cancel_token.cancel();

    // stdin reads block a worker thread; don't wait for them
    runtime.shutdown_background();

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

/// Tell the user where the freshly created config lives
fn show_new_config_message(config_path: &Path) {
    eprintln!(
        "A configuration file has been created at {}.\n\n\
        Set backend.base_url to your MelodyMatch backend (or export {}) and run again.",
        config_path.display(),
        melodymatch_core::config::BACKEND_URL_ENV
    );
}

/// Config file exists but is not valid TOML
fn show_config_parse_error(parse_error: &TomlParseError, config_path: &Path) {
    eprintln!(
        "Your configuration file has a syntax error and cannot be loaded.\n\n\
        File: {}\n\
        Error: {parse_error}",
        config_path.display()
    );
}

/// Config parses but a required value is missing or unusable
fn show_config_error(err: &CoreError, config_path: &Path) {
    eprintln!(
        "Configuration error: {err}\n\n\
        Please edit {} and run again.",
        config_path.display()
    );
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let config_path = MelodyMatchConfig::config_path();
    let Ok(content) = std::fs::read_to_string(&config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with console output and optional file logging.
///
/// Console logs go to stderr so they don't interleave with the feed on stdout.
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = melodymatch_core::paths::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
