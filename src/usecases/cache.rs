//! Market State Cache - Authoritative Off-chain Read Model
//!
//! Keyed by market address. Every refresh issues the full read batch
//! concurrently and replaces the whole entry on success; a failed
//! batch leaves the previous snapshot in place, so readers see stale
//! data over no data and never a mix of old and new fields.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::market::{MarketSnapshot, MarketState};
use crate::ports::chain_reader::ChainReader;

/// Thread-safe snapshot store over the chain reader.
///
/// Entry replacement is the unit of atomicity: refreshes of different
/// addresses never interfere, and same-address races resolve to
/// whichever complete batch finished last.
pub struct MarketCache {
    /// Chain read access for refresh batches.
    reader: Arc<dyn ChainReader>,
    /// address -> latest complete snapshot
    snapshots: DashMap<Address, MarketSnapshot>,
    /// Cumulative failed refresh batches (for metrics exposition).
    refresh_failures: AtomicU64,
}

impl MarketCache {
    pub fn new(reader: Arc<dyn ChainReader>) -> Self {
        Self {
            reader,
            snapshots: DashMap::new(),
            refresh_failures: AtomicU64::new(0),
        }
    }

    /// Re-read a market's full state and atomically replace its entry.
    ///
    /// The four view queries are independent and issued concurrently.
    /// On any failure the previous snapshot is retained and the error
    /// is returned after logging.
    pub async fn refresh(&self, address: Address) -> Result<MarketSnapshot> {
        let batch = tokio::try_join!(
            self.reader.market_info(address),
            self.reader.yes_price(address),
            self.reader.no_price(address),
            self.reader.pool_info(address),
        );

        let (info, yes_price, no_price, pool) = match batch {
            Ok(parts) => parts,
            Err(e) => {
                self.refresh_failures.fetch_add(1, Ordering::Relaxed);
                warn!(market = %address, error = %e, "cache refresh failed, keeping previous snapshot");
                return Err(e).with_context(|| format!("refresh of {address} failed"));
            }
        };

        let snapshot = MarketSnapshot {
            address,
            question: info.question,
            description: info.description,
            end_time: info.end_time,
            state: MarketState::from_contract(info.state),
            creator: info.creator,
            requires_verification: info.requires_verification,
            total_volume: info.total_volume,
            total_traders: u64::try_from(info.total_traders).unwrap_or(u64::MAX),
            yes_price,
            no_price,
            yes_shares: pool.yes_shares,
            no_shares: pool.no_shares,
            liquidity: pool.liquidity,
            last_updated: Utc::now(),
        };

        self.snapshots.insert(address, snapshot.clone());
        debug!(market = %address, state = %snapshot.state, "snapshot refreshed");
        Ok(snapshot)
    }

    /// Latest snapshot for one market, if cached.
    pub fn get(&self, address: Address) -> Option<MarketSnapshot> {
        self.snapshots.get(&address).map(|entry| entry.clone())
    }

    /// Point-in-time view of every cached snapshot. Order unspecified.
    pub fn get_all(&self) -> Vec<MarketSnapshot> {
        self.snapshots
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of cached markets.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Cumulative failed refresh batches.
    pub fn refresh_failures(&self) -> u64 {
        self.refresh_failures.load(Ordering::Relaxed)
    }

    /// Periodic full-cache sweep.
    ///
    /// Independent of event-driven refreshes; heals entries whose
    /// events were missed or undecodable. Runs until shutdown.
    pub async fn run_sweep(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        // First tick fires immediately; skip it so startup backfill
        // is not immediately repeated.
        ticker.tick().await;

        info!(interval_secs = interval.as_secs(), "cache sweep started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("cache sweep received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    let addresses: Vec<Address> =
                        self.snapshots.iter().map(|entry| *entry.key()).collect();
                    for address in addresses {
                        // Failures already logged + counted inside refresh
                        let _ = self.refresh(address).await;
                    }
                }
            }
        }
    }
}
