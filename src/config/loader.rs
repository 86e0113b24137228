//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config: AppConfig = toml::from_str(&content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  info!(
    name = %config.service.name,
    factory = config.chain.factory_address.as_deref().unwrap_or("<unset>"),
    poll_secs = config.chain.poll_interval_secs,
    sweep_secs = config.cache.sweep_interval_secs,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty RPC endpoint
/// - Parseable contract addresses where provided
/// - Non-zero cadences
fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.chain.rpc_url.is_empty(),
    "chain.rpc_url must not be empty"
  );
  anyhow::ensure!(
    config.chain.poll_interval_secs > 0,
    "chain.poll_interval_secs must be positive, got {}",
    config.chain.poll_interval_secs
  );
  anyhow::ensure!(
    config.cache.sweep_interval_secs > 0,
    "cache.sweep_interval_secs must be positive, got {}",
    config.cache.sweep_interval_secs
  );
  anyhow::ensure!(
    config.scheduler.check_interval_secs > 0,
    "scheduler.check_interval_secs must be positive, got {}",
    config.scheduler.check_interval_secs
  );

  // Addresses are optional but must parse when present
  if let Some(factory) = &config.chain.factory_address {
    factory
      .parse::<alloy::primitives::Address>()
      .with_context(|| format!("chain.factory_address is not a valid address: {factory}"))?;
  }
  if let Some(oracle) = &config.scheduler.oracle_address {
    oracle
      .parse::<alloy::primitives::Address>()
      .with_context(|| format!("scheduler.oracle_address is not a valid address: {oracle}"))?;
  }

  Ok(())
}
