//! Configuration loading and parsing.
//!
//! Precedence, lowest first:
//! 1. Default values
//! 2. Configuration file (TOML)
//! 3. Environment variables (`QUICD_STRM__` prefix, `__` separator)

use anyhow::{Context, Result};
use config::{Config as ConfigLoader, Environment};
use std::path::Path;

use super::EngineConfig;
use crate::error::Error;

/// Prefix shared by all environment overrides.
pub const ENV_PREFIX: &str = "QUICD_STRM";

/// Load, override and validate engine configuration.
///
/// A missing file is not an error; defaults are used instead.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration file cannot be read or parsed
/// - An environment override has the wrong type
/// - Validation fails
pub fn load(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let mut config = load_config_file(path.as_ref())?;

    apply_env_overrides(
        &mut config,
        Environment::with_prefix(ENV_PREFIX).separator("__"),
    )?;

    config
        .validate()
        .map_err(|errors| Error::Config(errors.join("; ")))
        .context("Configuration validation failed")?;

    Ok(config)
}

/// Load configuration from a TOML file.
fn load_config_file(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        tracing::warn!(
            config_path = %path.display(),
            "Configuration file not found, using defaults"
        );
        return Ok(EngineConfig::default());
    }

    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
}

/// Apply environment variable overrides.
///
/// Examples:
/// - `QUICD_STRM__POOL__MAX_CHAINS=1024`
/// - `QUICD_STRM__STREAM__MIN_SPLIT_LEN=128`
/// - `QUICD_STRM__LOGGING__LEVEL=debug`
fn apply_env_overrides(config: &mut EngineConfig, env: Environment) -> Result<()> {
    let env_config = ConfigLoader::builder()
        .add_source(env)
        .build()
        .context("Failed to load environment variables")?;

    if let Some(v) = get_usize(&env_config, "pool.max_chains")? {
        config.pool.max_chains = v;
    }
    if let Some(v) = get_usize(&env_config, "stream.min_split_len")? {
        config.stream.min_split_len = v;
    }
    if let Some(v) = get_usize(&env_config, "stream.max_span_count")? {
        config.stream.max_span_count = v;
    }
    if let Ok(level) = env_config.get_string("logging.level") {
        match level.parse() {
            Ok(parsed) => config.logging.level = parsed,
            Err(_) => tracing::warn!(level = %level, "Invalid log level override, ignoring"),
        }
    }

    Ok(())
}

fn get_usize(env_config: &ConfigLoader, key: &str) -> Result<Option<usize>> {
    match env_config.get_int(key) {
        Ok(v) => usize::try_from(v)
            .map(Some)
            .with_context(|| format!("Environment override {} out of range: {}", key, v)),
        Err(config::ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Invalid environment override for {}", key)),
    }
}
