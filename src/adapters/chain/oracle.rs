//! Oracle Adapter - Signer-backed Resolution Transactions
//!
//! Implements the `ResolutionSubmitter` port. Builds its own
//! wallet-filled provider so resolution traffic is signed with the
//! privileged oracle key, which comes only from the
//! `ORACLE_PRIVATE_KEY` environment variable - it never appears in
//! `config.toml` or logs.

use std::sync::Arc;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::config::{ChainConfig, SchedulerConfig};
use crate::ports::resolution::{ResolutionError, ResolutionSubmitter};

use super::abi::ResolutionOracle;

/// Environment variable holding the oracle signer key.
pub const ORACLE_KEY_ENV: &str = "ORACLE_PRIVATE_KEY";

/// `ResolutionSubmitter` implementation over a wallet-filled provider.
pub struct OracleSubmitter {
    /// Signer-backed provider (type-erased).
    provider: Arc<dyn Provider + Send + Sync>,
    /// Resolution oracle contract address.
    oracle: Address,
}

impl OracleSubmitter {
    /// Build the submitter from config + environment.
    ///
    /// Returns `None` (with a single log line) when the oracle address
    /// or signer key is missing or unusable: resolution submission is
    /// an optional subsystem and its absence must not stop the engine.
    pub fn from_env(chain: &ChainConfig, scheduler: &SchedulerConfig) -> Option<Self> {
        let Some(oracle_str) = scheduler.oracle_address.as_deref() else {
            info!("Oracle address not set - resolution submission disabled");
            return None;
        };

        let Ok(key) = std::env::var(ORACLE_KEY_ENV) else {
            info!("{ORACLE_KEY_ENV} not set - resolution submission disabled");
            return None;
        };

        // Addresses are validated at config load; re-parse defensively
        // since this runs after env lookups.
        let oracle: Address = match oracle_str.parse() {
            Ok(addr) => addr,
            Err(e) => {
                warn!(error = %e, "Invalid oracle address - resolution submission disabled");
                return None;
            }
        };

        let signer: PrivateKeySigner =
            match key.strip_prefix("0x").unwrap_or(&key).parse() {
                Ok(signer) => signer,
                Err(e) => {
                    warn!(error = %e, "Invalid {ORACLE_KEY_ENV} - resolution submission disabled");
                    return None;
                }
            };

        let rpc_url = match chain.rpc_url.parse() {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Invalid RPC URL - resolution submission disabled");
                return None;
            }
        };

        let signer_address = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .on_http(rpc_url);

        info!(oracle = %oracle, signer = %signer_address, "Oracle submitter initialized");

        Some(Self {
            provider: Arc::new(provider),
            oracle,
        })
    }

    /// Submit one oracle transaction and wait for its receipt.
    async fn submit(&self, calldata: Vec<u8>) -> Result<String, ResolutionError> {
        let tx = TransactionRequest::default()
            .to(self.oracle)
            .input(Bytes::from(calldata).into());

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ResolutionError::Transaction(format!("submission rejected: {e}")))?;

        let tx_hash = *pending.tx_hash();

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| {
                ResolutionError::Transaction(format!(
                    "confirmation failed for {tx_hash:#x}: {e}"
                ))
            })?;

        if !receipt.status() {
            return Err(ResolutionError::Transaction(format!(
                "transaction {tx_hash:#x} reverted"
            )));
        }

        Ok(format!("{:#x}", receipt.transaction_hash))
    }
}

#[async_trait]
impl ResolutionSubmitter for OracleSubmitter {
    #[instrument(skip(self), fields(market = %market, outcome))]
    async fn resolve(&self, market: Address, outcome: bool) -> Result<String, ResolutionError> {
        info!(market = %market, outcome, "Submitting market resolution");
        let call = ResolutionOracle::resolveMarketCall { market, outcome };
        let tx_hash = self.submit(call.abi_encode()).await?;
        info!(market = %market, tx_hash = %tx_hash, "Market resolution confirmed");
        Ok(tx_hash)
    }

    #[instrument(skip(self), fields(market = %market, outcome))]
    async fn submit_vote(
        &self,
        market: Address,
        outcome: bool,
    ) -> Result<String, ResolutionError> {
        info!(market = %market, outcome, "Submitting resolution vote");
        let call = ResolutionOracle::submitResolutionCall { market, outcome };
        let tx_hash = self.submit(call.abi_encode()).await?;
        info!(market = %market, tx_hash = %tx_hash, "Resolution vote confirmed");
        Ok(tx_hash)
    }
}
