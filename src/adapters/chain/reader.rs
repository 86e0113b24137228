//! Chain Reader Adapter - Log Queries and View Batches over alloy-rs
//!
//! Implements the `ChainReader` port against the shared RPC provider.
//! Log queries are built per contract with explicit event-signature
//! filters; decoding happens here so the use-case layer only sees
//! typed `ChainEvent`s.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::{Filter, TransactionRequest};
use alloy::sol_types::{SolCall, SolEvent};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::ports::chain_reader::{ChainEvent, ChainReader, MarketInfo, PoolState};

use super::abi::{MarketFactory, PredictionMarket};
use super::provider::RpcProvider;

/// `ChainReader` implementation over the type-erased alloy provider.
pub struct ContractReader {
    /// Shared RPC provider.
    provider: Arc<RpcProvider>,
}

impl ContractReader {
    pub fn new(provider: Arc<RpcProvider>) -> Self {
        Self { provider }
    }

    /// Issue one `eth_call` against `to` and decode the return values.
    async fn view<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return> {
        let calldata = Bytes::from(call.abi_encode());
        let raw = self
            .provider
            .inner()
            .call(
                &TransactionRequest::default()
                    .to(to)
                    .input(calldata.into()),
            )
            .await
            .with_context(|| format!("eth_call to {to} failed"))?;

        C::abi_decode_returns(&raw, true)
            .with_context(|| format!("failed to decode return data from {to}"))
    }

    /// Fetch raw logs for `contract` over the half-open range
    /// `(from, to]`, restricted to the given event signatures.
    async fn logs(
        &self,
        contract: Address,
        signatures: Vec<alloy::primitives::B256>,
        from_exclusive: u64,
        to_inclusive: u64,
    ) -> Result<Vec<alloy::rpc::types::Log>> {
        let filter = Filter::new()
            .address(contract)
            .event_signature(signatures)
            .from_block(from_exclusive + 1)
            .to_block(to_inclusive);

        self.provider
            .inner()
            .get_logs(&filter)
            .await
            .with_context(|| format!("eth_getLogs for {contract} failed"))
    }
}

/// Clamp a `uint256` timestamp-like value into `u64`.
fn as_u64(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

#[async_trait]
impl ChainReader for ContractReader {
    async fn block_number(&self) -> Result<u64> {
        self.provider
            .inner()
            .get_block_number()
            .await
            .context("eth_blockNumber failed")
    }

    #[instrument(skip(self), fields(factory = %factory))]
    async fn factory_markets(&self, factory: Address) -> Result<Vec<Address>> {
        let ret = self
            .view(factory, MarketFactory::getAllMarketsCall {})
            .await?;
        Ok(ret._0)
    }

    async fn factory_events(
        &self,
        factory: Address,
        from_exclusive: u64,
        to_inclusive: u64,
    ) -> Result<Vec<ChainEvent>> {
        let logs = self
            .logs(
                factory,
                vec![MarketFactory::MarketCreated::SIGNATURE_HASH],
                from_exclusive,
                to_inclusive,
            )
            .await?;

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            let decoded = log
                .log_decode::<MarketFactory::MarketCreated>()
                .context("failed to decode MarketCreated log")?;
            let data = decoded.inner.data;
            events.push(ChainEvent::MarketCreated {
                market: data.market,
                creator: data.creator,
                question: data.question,
                end_time: as_u64(data.endTime),
            });
        }

        debug!(
            factory = %factory,
            from = from_exclusive + 1,
            to = to_inclusive,
            count = events.len(),
            "factory log scan"
        );
        Ok(events)
    }

    async fn market_events(
        &self,
        market: Address,
        from_exclusive: u64,
        to_inclusive: u64,
    ) -> Result<Vec<ChainEvent>> {
        let logs = self
            .logs(
                market,
                vec![
                    PredictionMarket::SharesPurchased::SIGNATURE_HASH,
                    PredictionMarket::MarketResolved::SIGNATURE_HASH,
                ],
                from_exclusive,
                to_inclusive,
            )
            .await?;

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            let Some(topic0) = log.topic0() else {
                continue;
            };

            if *topic0 == PredictionMarket::SharesPurchased::SIGNATURE_HASH {
                let decoded = log
                    .log_decode::<PredictionMarket::SharesPurchased>()
                    .context("failed to decode SharesPurchased log")?;
                let data = decoded.inner.data;
                events.push(ChainEvent::SharesPurchased {
                    market,
                    buyer: data.buyer,
                    is_yes: data.isYes,
                    investment: data.investmentAmount,
                    shares: data.sharesReceived,
                    yes_price: data.yesPrice,
                    no_price: data.noPrice,
                });
            } else if *topic0 == PredictionMarket::MarketResolved::SIGNATURE_HASH {
                let decoded = log
                    .log_decode::<PredictionMarket::MarketResolved>()
                    .context("failed to decode MarketResolved log")?;
                let data = decoded.inner.data;
                events.push(ChainEvent::MarketResolved {
                    market,
                    outcome: data.outcome,
                    timestamp: as_u64(data.timestamp),
                });
            } else {
                debug!(topic = %topic0, market = %market, "unrecognised event topic");
            }
        }

        Ok(events)
    }

    async fn market_info(&self, market: Address) -> Result<MarketInfo> {
        let ret = self.view(market, PredictionMarket::marketInfoCall {}).await?;
        Ok(MarketInfo {
            question: ret.question,
            description: ret.description,
            end_time: as_u64(ret.endTime),
            state: ret.state,
            creator: ret.creator,
            requires_verification: ret.requiresVerification,
            total_volume: ret.totalVolume,
            total_traders: ret.totalTraders,
        })
    }

    async fn yes_price(&self, market: Address) -> Result<U256> {
        let ret = self.view(market, PredictionMarket::getYesPriceCall {}).await?;
        Ok(ret._0)
    }

    async fn no_price(&self, market: Address) -> Result<U256> {
        let ret = self.view(market, PredictionMarket::getNoPriceCall {}).await?;
        Ok(ret._0)
    }

    async fn pool_info(&self, market: Address) -> Result<PoolState> {
        let ret = self.view(market, PredictionMarket::getPoolInfoCall {}).await?;
        Ok(PoolState {
            yes_shares: ret.yesShares,
            no_shares: ret.noShares,
            liquidity: ret.liquidity,
        })
    }

    async fn user_balance(&self, market: Address, user: Address) -> Result<(U256, U256)> {
        let ret = self
            .view(market, PredictionMarket::getUserBalanceCall { user })
            .await?;
        Ok((ret.yes, ret.no))
    }

    async fn is_healthy(&self) -> bool {
        self.provider.is_healthy().await
    }
}
