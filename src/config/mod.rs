//! Configuration Module - TOML-based Engine Configuration
//!
//! Loads and validates configuration from `config.toml`.
//! All contract addresses, endpoints, and cadences are externalized
//! here - nothing is hardcoded in the use-case layer. The oracle
//! signer key is the one secret and comes only from the
//! `ORACLE_PRIVATE_KEY` environment variable.

pub mod loader;

use serde::Deserialize;

/// Top-level engine configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before any task is spawned.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and logging.
  pub service: ServiceConfig,
  /// HTTP/WebSocket server settings.
  #[serde(default)]
  pub server: ServerConfig,
  /// Chain RPC endpoint and scanner cadence.
  pub chain: ChainConfig,
  /// Market cache sweep cadence.
  #[serde(default)]
  pub cache: CacheConfig,
  /// Resolution scheduler cadence and oracle contract.
  #[serde(default)]
  pub scheduler: SchedulerConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  /// Bind address for the API + WebSocket server.
  #[serde(default = "default_bind_address")]
  pub bind_address: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      bind_address: default_bind_address(),
    }
  }
}

/// Chain access configuration.
///
/// The factory address is optional: when unset, the scanner subsystem
/// is disabled at startup and the engine serves an empty cache.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
  /// JSON-RPC endpoint URL.
  pub rpc_url: String,
  /// Market factory contract address (hex). Optional.
  #[serde(default)]
  pub factory_address: Option<String>,
  /// Seconds between scan ticks for each tracked contract.
  #[serde(default = "default_poll_interval")]
  pub poll_interval_secs: u64,
}

/// Cache sweep configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Seconds between full-cache refresh sweeps.
  #[serde(default = "default_sweep_interval")]
  pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      sweep_interval_secs: default_sweep_interval(),
    }
  }
}

/// Resolution scheduler configuration.
///
/// The oracle address is optional: when it (or the signer key env var)
/// is unset, resolution submission is disabled while the eligibility
/// sweep keeps running.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
  /// Seconds between eligibility checks.
  #[serde(default = "default_check_interval")]
  pub check_interval_secs: u64,
  /// Seconds a market must be past its end time before it is
  /// flagged as resolution-eligible.
  #[serde(default = "default_resolution_delay")]
  pub resolution_delay_secs: u64,
  /// Resolution oracle contract address (hex). Optional.
  #[serde(default)]
  pub oracle_address: Option<String>,
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      check_interval_secs: default_check_interval(),
      resolution_delay_secs: default_resolution_delay(),
      oracle_address: None,
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_bind_address() -> String {
  "0.0.0.0:3001".to_string()
}

fn default_poll_interval() -> u64 {
  5
}

fn default_sweep_interval() -> u64 {
  30
}

fn default_check_interval() -> u64 {
  300
}

fn default_resolution_delay() -> u64 {
  3600
}
