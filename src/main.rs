//! Prediction Market Sync Engine — Entry Point
//!
//! Initializes configuration, logging, the chain connection, and the
//! sync engine. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Connect the shared RPC provider
//! 4. Build the oracle submitter from ORACLE_PRIVATE_KEY (optional)
//! 5. Build the engine (cache + hub + scanner + scheduler)
//! 6. Backfill markets + spawn all periodic tasks
//! 7. Serve the API/WebSocket listener
//! 8. Wait for SIGINT → stop tasks, stop server, exit

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};

mod adapters;
mod config;
mod domain;
mod ports;
mod usecases;

use adapters::api::{build_router, AppState};
use adapters::chain::{ContractReader, OracleSubmitter, RpcProvider};
use adapters::metrics::MetricsRegistry;
use ports::chain_reader::ChainReader;
use ports::resolution::ResolutionSubmitter;
use usecases::engine::SyncEngine;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.service.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        factory = config.chain.factory_address.as_deref().unwrap_or("<unset>"),
        "Starting prediction market sync engine"
    );

    // ── 3. Connect the shared RPC provider ──────────────────
    let provider = Arc::new(
        RpcProvider::connect(&config.chain)
            .await
            .context("Failed to build RPC provider")?,
    );
    let reader: Arc<dyn ChainReader> = Arc::new(ContractReader::new(provider));

    // ── 4. Oracle submitter (optional subsystem) ────────────
    let submitter = OracleSubmitter::from_env(&config.chain, &config.scheduler)
        .map(|submitter| Arc::new(submitter) as Arc<dyn ResolutionSubmitter>);

    // ── 5. Build the engine ─────────────────────────────────
    let engine = Arc::new(SyncEngine::new(config.clone(), reader, submitter));

    // ── 6. Backfill + spawn periodic tasks ──────────────────
    engine.start().await.context("Failed to start engine")?;

    // ── 7. Serve the API/WebSocket listener ─────────────────
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to build metrics")?);
    let app = build_router(AppState {
        engine: Arc::clone(&engine),
        metrics,
    });

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
    info!(address = %config.server.bind_address, "API server listening");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    // ── 8. Wait for SIGINT ──────────────────────────────────
    signal::ctrl_c().await.context("Failed to listen for SIGINT")?;
    info!("SIGINT received, initiating graceful shutdown");

    engine.shutdown().await;
    server_handle.abort();

    info!("Shutdown complete");
    Ok(())
}
