//! Sync Engine - Owned State and Lifecycle
//!
//! One `SyncEngine` instance owns the cache, the broadcast hub, the
//! scanner registry, and the scheduler, and is handed to the API
//! layer by reference. Nothing in the engine is process-global; a
//! second instance would be a second, independent engine (running two
//! against the same contracts is unsupported - it would duplicate
//! polling and could double-submit resolutions).
//!
//! All periodic work is spawned as named, cancellable tasks sharing
//! one shutdown broadcast channel and stopped together.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::ports::chain_reader::ChainReader;
use crate::ports::resolution::ResolutionSubmitter;

use super::cache::MarketCache;
use super::hub::BroadcastHub;
use super::scanner::LogScanner;
use super::scheduler::ResolutionScheduler;

/// A periodic task owned by the engine.
struct NamedTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

/// The engine instance owning all mutable sync state.
pub struct SyncEngine {
    reader: Arc<dyn ChainReader>,
    cache: Arc<MarketCache>,
    hub: Arc<BroadcastHub>,
    scanner: LogScanner,
    scheduler: Arc<ResolutionScheduler>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: tokio::sync::Mutex<Vec<NamedTask>>,
    config: AppConfig,
}

impl SyncEngine {
    /// Wire up the engine from config and the chain adapters.
    ///
    /// `submitter` is `None` when resolution submission is not
    /// configured; everything else still runs.
    pub fn new(
        config: AppConfig,
        reader: Arc<dyn ChainReader>,
        submitter: Option<Arc<dyn ResolutionSubmitter>>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let cache = Arc::new(MarketCache::new(Arc::clone(&reader)));
        let hub = Arc::new(BroadcastHub::new());
        let scanner = LogScanner::new(
            Arc::clone(&reader),
            Arc::clone(&cache),
            Arc::clone(&hub),
            Duration::from_secs(config.chain.poll_interval_secs),
            shutdown_tx.clone(),
        );
        let scheduler = Arc::new(ResolutionScheduler::new(
            Arc::clone(&cache),
            submitter,
            config.scheduler.resolution_delay_secs,
            Duration::from_secs(config.scheduler.check_interval_secs),
        ));

        Self {
            reader,
            cache,
            hub,
            scanner,
            scheduler,
            shutdown_tx,
            tasks: tokio::sync::Mutex::new(Vec::new()),
            config,
        }
    }

    /// Start every subsystem.
    ///
    /// A failing optional subsystem degrades the engine instead of
    /// stopping startup: with no factory configured (or a failing
    /// backfill) the API serves whatever the cache holds.
    pub async fn start(&self) -> Result<()> {
        match self.factory_address()? {
            Some(factory) => {
                if let Err(e) = self.scanner.bootstrap(factory).await {
                    error!(error = %e, "scanner bootstrap failed - continuing without full backfill");
                } else {
                    info!(
                        tracked = self.scanner.tracked_count(),
                        cached = self.cache.len(),
                        "scanner started"
                    );
                }
            }
            None => {
                info!("factory address not set - chain scanner disabled");
            }
        }

        let mut tasks = self.tasks.lock().await;

        tasks.push(NamedTask {
            name: "cache-sweep",
            handle: tokio::spawn(Arc::clone(&self.cache).run_sweep(
                Duration::from_secs(self.config.cache.sweep_interval_secs),
                self.shutdown_tx.subscribe(),
            )),
        });

        tasks.push(NamedTask {
            name: "resolution-check",
            handle: tokio::spawn(
                Arc::clone(&self.scheduler).run(self.shutdown_tx.subscribe()),
            ),
        });

        info!(periodic_tasks = tasks.len(), "engine started");
        Ok(())
    }

    /// Stop every periodic task and poller.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            match tokio::time::timeout(Duration::from_secs(5), task.handle).await {
                Ok(_) => info!(task = task.name, "task stopped"),
                Err(_) => warn!(task = task.name, "task did not stop in time"),
            }
        }

        // Pollers select! on the same shutdown channel; abort covers
        // any blocked mid-RPC (reads are side-effect free if dropped).
        self.scanner.abort_all();

        info!("engine shutdown complete");
    }

    fn factory_address(&self) -> Result<Option<Address>> {
        self.config
            .chain
            .factory_address
            .as_deref()
            .map(|raw| raw.parse().context("invalid factory address"))
            .transpose()
    }

    pub fn cache(&self) -> &Arc<MarketCache> {
        &self.cache
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    pub fn scanner(&self) -> &LogScanner {
        &self.scanner
    }

    pub fn scheduler(&self) -> &Arc<ResolutionScheduler> {
        &self.scheduler
    }

    pub fn reader(&self) -> &Arc<dyn ChainReader> {
        &self.reader
    }
}
