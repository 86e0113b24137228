//! Prometheus Metrics Registry - Sync Engine Observability
//!
//! All metrics follow the naming convention `market_sync_*`. Values
//! come from counters the use-case layer already keeps, sampled at
//! scrape time; the use cases themselves stay free of any metrics
//! dependency.

use prometheus::{Encoder, IntGauge, Registry, TextEncoder};

use crate::usecases::engine::SyncEngine;

/// Centralized Prometheus metrics for the sync engine.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Tracked contracts (factory + markets).
    pub tracked_contracts: IntGauge,
    /// Cached market snapshots.
    pub cached_markets: IntGauge,
    /// Live WebSocket connections.
    pub connected_clients: IntGauge,
    /// Cumulative decoded chain events handled.
    pub events_handled: IntGauge,
    /// Cumulative broadcast fan-out calls.
    pub events_broadcast: IntGauge,
    /// Cumulative failed cache refresh batches.
    pub refresh_failures: IntGauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let tracked_contracts = IntGauge::new(
            "market_sync_tracked_contracts",
            "Contracts with an active polling task",
        )?;
        let cached_markets = IntGauge::new(
            "market_sync_cached_markets",
            "Market snapshots currently cached",
        )?;
        let connected_clients = IntGauge::new(
            "market_sync_connected_clients",
            "Live WebSocket client connections",
        )?;
        let events_handled = IntGauge::new(
            "market_sync_events_handled",
            "Decoded chain events handled since startup",
        )?;
        let events_broadcast = IntGauge::new(
            "market_sync_events_broadcast",
            "Broadcast fan-out calls since startup",
        )?;
        let refresh_failures = IntGauge::new(
            "market_sync_refresh_failures",
            "Failed cache refresh batches since startup",
        )?;

        registry.register(Box::new(tracked_contracts.clone()))?;
        registry.register(Box::new(cached_markets.clone()))?;
        registry.register(Box::new(connected_clients.clone()))?;
        registry.register(Box::new(events_handled.clone()))?;
        registry.register(Box::new(events_broadcast.clone()))?;
        registry.register(Box::new(refresh_failures.clone()))?;

        Ok(Self {
            registry,
            tracked_contracts,
            cached_markets,
            connected_clients,
            events_handled,
            events_broadcast,
            refresh_failures,
        })
    }

    /// Sample live engine state into the gauges.
    pub fn sample(&self, engine: &SyncEngine) {
        self.tracked_contracts
            .set(engine.scanner().tracked_count() as i64);
        self.cached_markets.set(engine.cache().len() as i64);
        self.connected_clients
            .set(engine.hub().client_count() as i64);
        self.events_handled
            .set(engine.scanner().events_handled() as i64);
        self.events_broadcast
            .set(engine.hub().events_broadcast() as i64);
        self.refresh_failures
            .set(engine.cache().refresh_failures() as i64);
    }

    /// Encode the registry in Prometheus text exposition format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
