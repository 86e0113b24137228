//! Chain Reader Port - Read-only Chain Access Interface
//!
//! Defines the trait the scanner and cache require from the RPC
//! layer: head-block queries, decoded log ranges, and the view
//! functions that make up a snapshot read batch. Implemented over
//! alloy-rs in the adapters layer; mocked in tests.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

/// A decoded log event from a tracked contract.
///
/// Decoding happens in the adapter (where the ABI lives); the scanner
/// only ever sees typed events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// Factory: a new market contract was deployed.
    MarketCreated {
        market: Address,
        creator: Address,
        question: String,
        end_time: u64,
    },
    /// Market: shares were purchased.
    SharesPurchased {
        market: Address,
        buyer: Address,
        is_yes: bool,
        investment: U256,
        shares: U256,
        yes_price: U256,
        no_price: U256,
    },
    /// Market: the outcome was finalized on-chain.
    MarketResolved {
        market: Address,
        outcome: bool,
        timestamp: u64,
    },
}

/// Result of the market's `marketInfo()` view function.
#[derive(Debug, Clone)]
pub struct MarketInfo {
    /// Market question text.
    pub question: String,
    /// Longer-form description.
    pub description: String,
    /// Trading end time (Unix seconds).
    pub end_time: u64,
    /// Raw contract state discriminant (0 = Open, 1 = Closed, 2 = Resolved).
    pub state: u8,
    /// Market creator address.
    pub creator: Address,
    /// Whether participation requires identity verification.
    pub requires_verification: bool,
    /// Cumulative traded volume.
    pub total_volume: U256,
    /// Number of distinct traders.
    pub total_traders: U256,
}

/// Result of the market's `getPoolInfo()` view function.
#[derive(Debug, Clone)]
pub struct PoolState {
    /// YES shares in the pool.
    pub yes_shares: U256,
    /// NO shares in the pool.
    pub no_shares: U256,
    /// Pool collateral (USDC).
    pub liquidity: U256,
}

/// Trait for read-only chain access via alloy-rs.
///
/// Log queries use half-open block ranges `(from, to]` so callers can
/// pass the previous scan pointer directly. Each view method is one
/// independent RPC call; the cache composes them concurrently.
#[async_trait]
pub trait ChainReader: Send + Sync + 'static {
    /// Current chain head block number.
    async fn block_number(&self) -> anyhow::Result<u64>;

    /// Enumerate all existing markets via the factory's view function.
    async fn factory_markets(&self, factory: Address) -> anyhow::Result<Vec<Address>>;

    /// Decoded `MarketCreated` events from the factory over `(from, to]`.
    async fn factory_events(
        &self,
        factory: Address,
        from_exclusive: u64,
        to_inclusive: u64,
    ) -> anyhow::Result<Vec<ChainEvent>>;

    /// Decoded `SharesPurchased` / `MarketResolved` events from one
    /// market over `(from, to]`.
    async fn market_events(
        &self,
        market: Address,
        from_exclusive: u64,
        to_inclusive: u64,
    ) -> anyhow::Result<Vec<ChainEvent>>;

    /// The market's metadata view (`marketInfo()`).
    async fn market_info(&self, market: Address) -> anyhow::Result<MarketInfo>;

    /// Current YES price (`getYesPrice()`).
    async fn yes_price(&self, market: Address) -> anyhow::Result<U256>;

    /// Current NO price (`getNoPrice()`).
    async fn no_price(&self, market: Address) -> anyhow::Result<U256>;

    /// Pool composition (`getPoolInfo()`).
    async fn pool_info(&self, market: Address) -> anyhow::Result<PoolState>;

    /// A user's YES/NO share balances (`getUserBalance(address)`).
    async fn user_balance(
        &self,
        market: Address,
        user: Address,
    ) -> anyhow::Result<(U256, U256)>;

    /// Check if the RPC connection is healthy.
    async fn is_healthy(&self) -> bool;
}
