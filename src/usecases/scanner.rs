//! Chain Log Scanner - Polling Event Ingestion + Market Discovery
//!
//! One polling task per tracked contract (the factory plus every
//! discovered market). Each tick reads the chain head and queries the
//! half-open block range since the last scan. Polling is the default
//! strategy because the upstream RPC providers have no reliable push
//! filter subscription; the `ChainReader` port keeps the strategy
//! swappable.
//!
//! The scan pointer advances to the head after every processed batch
//! even when individual event handlers fail: such events are lost for
//! good. A failed log query, by contrast, leaves the pointer alone so
//! the same range is retried on the next tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::events::BroadcastEvent;
use crate::ports::chain_reader::{ChainEvent, ChainReader};

use super::cache::MarketCache;
use super::hub::BroadcastHub;

/// What a tracked address is, which decides the event set scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
    /// The market factory (scanned for `MarketCreated`).
    Factory,
    /// One market instance (scanned for trades and resolution).
    Market,
}

/// A contract with an active polling task.
///
/// Entries live for the process lifetime; markets are never delisted.
/// Removal, if ever needed, only has to go through the scanner's
/// registry.
pub struct TrackedContract {
    pub kind: ContractKind,
    /// Highest block already scanned for this contract.
    pub last_scanned_block: Arc<AtomicU64>,
    /// The polling task; aborted on engine shutdown.
    pub poll_handle: JoinHandle<()>,
}

/// Polling scanner over every tracked contract.
///
/// Cheap to clone: clones share one registry, so poll tasks carry
/// their own handle into the discovery path.
#[derive(Clone)]
pub struct LogScanner {
    inner: Arc<ScannerInner>,
}

struct ScannerInner {
    reader: Arc<dyn ChainReader>,
    cache: Arc<MarketCache>,
    hub: Arc<BroadcastHub>,
    /// address -> active poller. Registration is idempotent.
    tracked: DashMap<Address, TrackedContract>,
    poll_interval: Duration,
    shutdown_tx: broadcast::Sender<()>,
    /// Cumulative decoded events handled (for metrics exposition).
    events_handled: AtomicU64,
}

impl LogScanner {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        cache: Arc<MarketCache>,
        hub: Arc<BroadcastHub>,
        poll_interval: Duration,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self {
            inner: Arc::new(ScannerInner {
                reader,
                cache,
                hub,
                tracked: DashMap::new(),
                poll_interval,
                shutdown_tx,
                events_handled: AtomicU64::new(0),
            }),
        }
    }

    /// Start scanning: backfill existing markets from the factory's
    /// view function, then begin incremental polling of the factory
    /// itself.
    pub async fn bootstrap(&self, factory: Address) -> Result<()> {
        let markets = self
            .inner
            .reader
            .factory_markets(factory)
            .await
            .context("factory enumeration failed")?;

        info!(markets = markets.len(), factory = %factory, "backfilling existing markets");

        for market in markets {
            self.register_market(market).await;
        }

        self.track(factory, ContractKind::Factory)
            .await
            .context("failed to start factory poller")?;

        Ok(())
    }

    /// Register a market for polling and seed its snapshot.
    ///
    /// Idempotent: returns `true` only when the address was newly
    /// registered and its poller started. Callers emit `NewMarket`
    /// only on `true`, so a re-observed address never double-fires.
    pub async fn register_market(&self, market: Address) -> bool {
        match self.track(market, ContractKind::Market).await {
            Ok(true) => {
                // Seed the snapshot; a failure here is healed by the
                // cache sweep.
                let _ = self.inner.cache.refresh(market).await;
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(market = %market, error = %e, "market registration failed");
                false
            }
        }
    }

    /// Insert a tracked contract and spawn its poll task.
    ///
    /// Returns `Ok(false)` when the address is already tracked.
    async fn track(&self, address: Address, kind: ContractKind) -> Result<bool> {
        if self.inner.tracked.contains_key(&address) {
            return Ok(false);
        }

        // Scan forward only: events before registration are covered by
        // the backfill enumeration, not by log replay.
        let head = self
            .inner
            .reader
            .block_number()
            .await
            .context("head read at registration failed")?;

        match self.inner.tracked.entry(address) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                let last = Arc::new(AtomicU64::new(head));
                let handle = self.spawn_poller(address, kind, Arc::clone(&last));
                slot.insert(TrackedContract {
                    kind,
                    last_scanned_block: last,
                    poll_handle: handle,
                });
                info!(contract = %address, kind = ?kind, from_block = head, "poller registered");
                Ok(true)
            }
        }
    }

    fn spawn_poller(
        &self,
        address: Address,
        kind: ContractKind,
        last: Arc<AtomicU64>,
    ) -> JoinHandle<()> {
        let scanner = self.clone();
        let mut shutdown_rx = self.inner.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(scanner.inner.poll_interval);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        debug!(contract = %address, "poller received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        scanner.tick(address, kind, &last).await;
                    }
                }
            }
        })
    }

    /// One scan tick for one contract.
    async fn tick(&self, address: Address, kind: ContractKind, last: &AtomicU64) {
        let head = match self.inner.reader.block_number().await {
            Ok(head) => head,
            Err(e) => {
                warn!(contract = %address, error = %e, "head read failed, retrying next tick");
                return;
            }
        };

        let from = last.load(Ordering::SeqCst);
        if head <= from {
            return;
        }

        let events = match kind {
            ContractKind::Factory => {
                self.inner.reader.factory_events(address, from, head).await
            }
            ContractKind::Market => {
                self.inner.reader.market_events(address, from, head).await
            }
        };

        let events = match events {
            Ok(events) => events,
            Err(e) => {
                // Pointer untouched: this range is retried next tick.
                warn!(contract = %address, error = %e, "log query failed, retrying next tick");
                return;
            }
        };

        for event in events {
            self.inner.events_handled.fetch_add(1, Ordering::Relaxed);
            self.handle_event(event).await;
        }

        // Unconditional advance: a handler error above loses that
        // event's effect rather than re-running the range (which would
        // duplicate pushes to clients).
        last.store(head, Ordering::SeqCst);
    }

    async fn handle_event(&self, event: ChainEvent) {
        match event {
            ChainEvent::MarketCreated {
                market,
                creator,
                question,
                end_time,
            } => {
                if self.register_market(market).await {
                    info!(
                        market = %market,
                        question = %question,
                        creator = %creator,
                        end_time,
                        "new market created"
                    );
                    self.inner.hub.broadcast(&BroadcastEvent::NewMarket {
                        market,
                        question,
                        creator,
                    });
                }
            }
            ChainEvent::SharesPurchased {
                market,
                buyer,
                is_yes,
                shares,
                yes_price,
                no_price,
                investment: _,
            } => {
                debug!(
                    market = %market,
                    buyer = %buyer,
                    is_yes,
                    shares = %shares,
                    "trade observed"
                );
                let _ = self.inner.cache.refresh(market).await;
                self.inner.hub.broadcast(&BroadcastEvent::Trade {
                    market,
                    buyer,
                    is_yes,
                    shares,
                    yes_price,
                    no_price,
                });
            }
            ChainEvent::MarketResolved {
                market,
                outcome,
                timestamp: _,
            } => {
                info!(market = %market, outcome, "market resolved on-chain");
                let _ = self.inner.cache.refresh(market).await;
                self.inner
                    .hub
                    .broadcast(&BroadcastEvent::MarketResolved { market, outcome });
            }
        }
    }

    /// Whether an address already has an active poller.
    pub fn is_tracked(&self, address: Address) -> bool {
        self.inner.tracked.contains_key(&address)
    }

    /// Number of tracked contracts (factory included).
    pub fn tracked_count(&self) -> usize {
        self.inner.tracked.len()
    }

    /// Cumulative decoded events handled.
    pub fn events_handled(&self) -> u64 {
        self.inner.events_handled.load(Ordering::Relaxed)
    }

    /// Last scanned block for a tracked contract.
    pub fn last_scanned_block(&self, address: Address) -> Option<u64> {
        self.inner
            .tracked
            .get(&address)
            .map(|entry| entry.last_scanned_block.load(Ordering::SeqCst))
    }

    /// Abort every poll task. Called by the engine after the shutdown
    /// signal so blocked pollers do not outlive the process teardown.
    pub fn abort_all(&self) {
        for entry in &self.inner.tracked {
            entry.value().poll_handle.abort();
        }
    }
}
