//! Resolution Port - Privileged Oracle Transaction Interface
//!
//! Defines the trait for submitting market resolutions through the
//! oracle contract with a privileged signer, and the typed error
//! surface callers match on. Failures are never retried here;
//! retrying a state-changing call is the operator's decision.

use alloy::primitives::Address;
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by resolution submission.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The oracle address or signer key is not configured. Returned
    /// before any network call is made.
    #[error("resolution not configured: {0}")]
    Configuration(String),

    /// The transaction was rejected, reverted, or confirmation failed.
    #[error("resolution transaction failed: {0}")]
    Transaction(String),
}

/// Trait for oracle-signed resolution transactions.
///
/// Both calls submit a state-changing transaction and wait for the
/// on-chain receipt before returning the confirmed transaction hash.
#[async_trait]
pub trait ResolutionSubmitter: Send + Sync + 'static {
    /// Submit a final resolution for a market.
    async fn resolve(
        &self,
        market: Address,
        outcome: bool,
    ) -> Result<String, ResolutionError>;

    /// Submit one resolution vote (multi-party voting path).
    async fn submit_vote(
        &self,
        market: Address,
        outcome: bool,
    ) -> Result<String, ResolutionError>;
}
