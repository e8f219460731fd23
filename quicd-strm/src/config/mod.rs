//! Engine configuration module.
//!
//! Settings are grouped per subsystem and composed into [`EngineConfig`]:
//!
//! - **Pool:** Frame-Chain record capacity
//! - **Stream:** pop split and merge limits
//! - **Logging:** default log level
//!
//! # Example
//!
//! ```toml
//! [pool]
//! max_chains = 65536
//!
//! [stream]
//! min_split_len = 256
//! max_span_count = 256
//!
//! [logging]
//! level = "info"
//! ```

pub mod engine;
pub mod loader;
pub mod logging;

pub use engine::{PoolConfig, StreamConfig};
pub use loader::load;
pub use logging::{LogLevel, LoggingConfig};

use serde::{Deserialize, Serialize};

/// Top-level configuration for one stream engine instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frame-Chain pool configuration
    pub pool: PoolConfig,

    /// Per-stream queue configuration
    pub stream: StreamConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Validate every subsystem, collecting all violations.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Err(e) = self.pool.validate() {
            errors.extend(e);
        }

        if let Err(e) = self.stream.validate() {
            errors.extend(e);
        }

        // Cutting a queued chain needs one record beyond the chain itself.
        if self.pool.max_chains == 1 {
            errors.push(format!(
                "pool.max_chains ({}) leaves no record for the remainder of a cut chain",
                self.pool.max_chains
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
