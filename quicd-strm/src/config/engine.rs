//! Pool and stream queue settings.

use serde::{Deserialize, Serialize};

use crate::pool::MAX_STREAM_SPANS;

/// Frame-Chain pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of live Frame-Chain records.
    ///
    /// Allocation beyond this reports pool exhaustion to the caller.
    ///
    /// **Default:** `65536`
    pub max_chains: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_chains: 65536 }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_chains == 0 {
            errors.push("pool.max_chains must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Outgoing Frame Queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Smallest budget for which a pop splits its head chain.
    ///
    /// Budgets below this return nothing rather than a tiny fragment of the
    /// head. Bytes merged from following chains are not subject to it.
    ///
    /// **Default:** `256`
    pub min_split_len: usize,

    /// Maximum number of spans in a popped chain.
    ///
    /// **Default:** `256`
    pub max_span_count: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            min_split_len: 256,
            max_span_count: MAX_STREAM_SPANS,
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_span_count == 0 {
            errors.push("stream.max_span_count must be > 0".to_string());
        }

        if self.max_span_count > MAX_STREAM_SPANS {
            errors.push(format!(
                "stream.max_span_count ({}) exceeds the hard limit of {}",
                self.max_span_count, MAX_STREAM_SPANS
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
