//! Log output for the terminal host.
//!
//! The terminal belongs to the UI, so logs only ever go to a file. Without a
//! configured file nothing is installed and every `tracing` macro is a no-op.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use finder_tree::error::{Result, TreeError};

/// Environment variable holding a filter directive, e.g. `finder_tree=debug`.
pub const LOG_ENV: &str = "FINDER_LOG";

/// Filter from `$FINDER_LOG`, falling back to the configured level.
pub fn build_env_filter(default_level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }
    EnvFilter::try_new(default_level)
        .map_err(|e| TreeError::Config(format!("invalid log level {default_level:?}: {e}")))
}

/// Install a file-backed subscriber. `None` leaves logging off.
pub fn init_logging(file: Option<&Path>, default_level: &str) -> Result<()> {
    let Some(file) = file else {
        return Ok(());
    };
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let writer = OpenOptions::new().create(true).append(true).open(file)?;
    let filter = build_env_filter(default_level)?;

    Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(Mutex::new(writer)),
        )
        .try_init()
        .map_err(|e| TreeError::Config(format!("failed to install logger: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_level_parses() {
        std::env::remove_var(LOG_ENV);
        assert!(build_env_filter("debug").is_ok());
        assert!(build_env_filter("finder_tree=trace,warn").is_ok());
    }

    #[test]
    fn garbage_level_is_config_error() {
        std::env::remove_var(LOG_ENV);
        assert!(matches!(
            build_env_filter("finder_tree=loudest"),
            Err(TreeError::Config(_))
        ));
    }

    #[test]
    fn no_file_means_no_subscriber() {
        assert!(init_logging(None, "info").is_ok());
    }
}
