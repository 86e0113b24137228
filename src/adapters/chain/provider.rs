//! RPC Provider - alloy-rs 0.9 Connection Management
//!
//! Manages the connection to the chain via alloy-rs. Validates RPC
//! connectivity at startup and exposes a shared provider instance for
//! all on-chain operations.
//!
//! In alloy 0.9, `ProviderBuilder::new().on_http()` returns a complex
//! filler type. We store it as a type-erased `dyn Provider` to keep
//! the API clean across the adapter layer.

use std::sync::Arc;

use alloy::providers::{Provider, ProviderBuilder};
use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::config::ChainConfig;

/// Shared RPC provider backed by alloy-rs 0.9.
///
/// All chain adapters share a single provider instance to avoid
/// redundant connections and enable connection pooling.
///
/// Uses `dyn Provider` for type erasure because alloy 0.9's
/// `ProviderBuilder::new().on_http()` returns a deeply-nested
/// generic filler type that would leak implementation details.
pub struct RpcProvider {
    /// The alloy HTTP provider (type-erased).
    provider: Arc<dyn Provider + Send + Sync>,
}

impl RpcProvider {
    /// Connect to the RPC endpoint and probe it.
    ///
    /// The URL comes from `config.toml` (never hardcoded). The chain
    /// ID is queried once at startup as a connectivity check and
    /// logged for the operator; the engine itself is chain-agnostic.
    #[instrument(skip_all)]
    pub async fn connect(config: &ChainConfig) -> Result<Self> {
        // alloy 0.9: on_http() is synchronous, returns impl Provider
        let provider = ProviderBuilder::new()
            .on_http(config.rpc_url.parse().context("Invalid RPC URL")?);

        let provider: Arc<dyn Provider + Send + Sync> = Arc::new(provider);

        // Connectivity probe only: an unreachable endpoint degrades
        // the engine (stale/empty cache) instead of stopping startup.
        match provider.get_chain_id().await {
            Ok(chain_id) => info!(chain_id, "Connected to chain RPC"),
            Err(e) => warn!(error = %e, "chain ID probe failed - RPC currently unreachable"),
        }

        Ok(Self { provider })
    }

    /// Get a shared reference to the alloy provider (type-erased).
    pub fn inner(&self) -> Arc<dyn Provider + Send + Sync> {
        Arc::clone(&self.provider)
    }

    /// Check if the RPC connection is healthy via a lightweight call.
    pub async fn is_healthy(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }
}
