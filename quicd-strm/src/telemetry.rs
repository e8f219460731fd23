//! # Telemetry
//!
//! Structured logging for embedders and tests. The engine itself only emits
//! `tracing` events; nothing is logged unless a subscriber is installed.
//!
//! | Level   | Events                                              |
//! |---------|-----------------------------------------------------|
//! | `trace` | per-pop decisions: trims, merges, splits, re-homes  |
//! | `debug` | pool exhaustion, reorder buffer discards            |
//! | `warn`  | configuration fallbacks                             |

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize structured logging.
///
/// `RUST_LOG` takes precedence over the configured level. Returns an error
/// if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.to_string()))
        .context("Failed to build log filter")?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(config.include_file_line)
        .with_file(config.include_file_line);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Logging already initialized")?;

    tracing::info!(level = %config.level, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_error() {
        let config = LoggingConfig::default();
        // The first call may lose a race with another test's subscriber;
        // either way a second call must fail without panicking.
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }
}
