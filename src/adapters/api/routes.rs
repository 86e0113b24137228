//! HTTP Routes - Read API, Admin API, Health, Metrics
//!
//! Response bodies keep the upstream envelope: `{"success": true,
//! ...}` on the happy path, `{"success": false, "error": ...}` with
//! an appropriate status otherwise. Market and oracle routes mirror
//! the upstream backend's `/api/markets` and `/api/oracle` surface.

use std::sync::Arc;

use alloy::primitives::Address;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::adapters::metrics::MetricsRegistry;
use crate::domain::market::format_units;
use crate::ports::resolution::ResolutionError;
use crate::usecases::engine::SyncEngine;

use super::ws::ws_handler;

/// Decimals of the fixed-point price/share representation.
const SHARE_DECIMALS: u8 = 18;
/// USDC decimals (pool liquidity).
const USDC_DECIMALS: u8 = 6;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SyncEngine>,
    pub metrics: Arc<MetricsRegistry>,
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws_handler))
        .route("/api/markets", get(list_markets))
        .route("/api/markets/:address", get(get_market))
        .route("/api/markets/:address/prices", get(market_prices))
        .route("/api/markets/:address/pool", get(market_pool))
        .route("/api/markets/:address/user/:user", get(user_balance))
        .route("/api/oracle/resolve", post(resolve_market))
        .route("/api/oracle/vote", post(submit_vote))
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({ "success": false, "error": message.into() })),
    )
        .into_response()
}

fn parse_address(raw: &str) -> Result<Address, Response> {
    raw.parse().map_err(|_| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid address: {raw}"),
        )
    })
}

/// GET /health
///
/// Liveness is unconditional; the chain field reports whether the RPC
/// endpoint currently answers (the engine keeps serving stale data
/// either way).
async fn health(State(state): State<AppState>) -> Json<Value> {
    let chain = if state.engine.reader().is_healthy().await {
        "ok"
    } else {
        "unreachable"
    };
    Json(json!({
        "status": "ok",
        "chain": chain,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /metrics - Prometheus exposition.
///
/// Gauges are sampled from live engine state at scrape time.
async fn metrics(State(state): State<AppState>) -> Response {
    state.metrics.sample(&state.engine);
    match state.metrics.render() {
        Ok(body) => body.into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// GET /api/markets - every cached snapshot.
async fn list_markets(State(state): State<AppState>) -> Json<Value> {
    let markets = state.engine.cache().get_all();
    Json(json!({
        "success": true,
        "count": markets.len(),
        "markets": markets,
    }))
}

/// GET /api/markets/:address - one snapshot, refreshed first.
///
/// The refresh is best-effort: when it fails the previous snapshot
/// (if any) is served stale.
async fn get_market(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Response {
    let address = match parse_address(&address) {
        Ok(address) => address,
        Err(response) => return response,
    };

    let _ = state.engine.cache().refresh(address).await;

    match state.engine.cache().get(address) {
        Some(market) => Json(json!({ "success": true, "market": market })).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Market not found"),
    }
}

/// GET /api/markets/:address/prices - live yes/no price read.
async fn market_prices(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Response {
    let address = match parse_address(&address) {
        Ok(address) => address,
        Err(response) => return response,
    };

    let reader = state.engine.reader();
    let prices = tokio::try_join!(reader.yes_price(address), reader.no_price(address));

    match prices {
        Ok((yes, no)) => Json(json!({
            "success": true,
            "prices": {
                "yes": yes.to_string(),
                "no": no.to_string(),
                "yesFormatted": format_units(yes, SHARE_DECIMALS),
                "noFormatted": format_units(no, SHARE_DECIMALS),
            }
        }))
        .into_response(),
        Err(e) => {
            warn!(market = %address, error = %e, "price read failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /api/markets/:address/pool - live pool composition read.
async fn market_pool(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Response {
    let address = match parse_address(&address) {
        Ok(address) => address,
        Err(response) => return response,
    };

    match state.engine.reader().pool_info(address).await {
        Ok(pool) => Json(json!({
            "success": true,
            "pool": {
                "yesShares": pool.yes_shares.to_string(),
                "noShares": pool.no_shares.to_string(),
                "liquidity": pool.liquidity.to_string(),
                "yesSharesFormatted": format_units(pool.yes_shares, SHARE_DECIMALS),
                "noSharesFormatted": format_units(pool.no_shares, SHARE_DECIMALS),
                "liquidityFormatted": format_units(pool.liquidity, USDC_DECIMALS),
            }
        }))
        .into_response(),
        Err(e) => {
            warn!(market = %address, error = %e, "pool read failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /api/markets/:address/user/:user - per-user share balances.
async fn user_balance(
    State(state): State<AppState>,
    Path((address, user)): Path<(String, String)>,
) -> Response {
    let address = match parse_address(&address) {
        Ok(address) => address,
        Err(response) => return response,
    };
    let user = match parse_address(&user) {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.engine.reader().user_balance(address, user).await {
        Ok((yes, no)) => Json(json!({
            "success": true,
            "balances": {
                "yes": yes.to_string(),
                "no": no.to_string(),
                "yesFormatted": format_units(yes, SHARE_DECIMALS),
                "noFormatted": format_units(no, SHARE_DECIMALS),
            }
        }))
        .into_response(),
        Err(e) => {
            warn!(market = %address, user = %user, error = %e, "balance read failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Parsed and validated resolution request body.
fn parse_resolution_body(body: &Value) -> Result<(Address, bool), Response> {
    let (Some(market), Some(outcome)) = (
        body.get("marketAddress").and_then(Value::as_str),
        body.get("outcome").and_then(Value::as_bool),
    ) else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "marketAddress and outcome (boolean) are required",
        ));
    };

    Ok((parse_address(market)?, outcome))
}

fn resolution_error_response(error: &ResolutionError) -> Response {
    let status = match error {
        ResolutionError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
        ResolutionError::Transaction(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, error.to_string())
}

/// POST /api/oracle/resolve - submit a final resolution.
async fn resolve_market(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Response {
    let (market, outcome) = match parse_resolution_body(&body) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    match state.engine.scheduler().resolve(market, outcome).await {
        Ok(tx_hash) => Json(json!({
            "success": true,
            "transactionHash": tx_hash,
            "message": format!(
                "Market {market} resolved with outcome: {}",
                if outcome { "YES" } else { "NO" }
            ),
        }))
        .into_response(),
        Err(e) => resolution_error_response(&e),
    }
}

/// POST /api/oracle/vote - submit one resolution vote.
async fn submit_vote(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Response {
    let (market, outcome) = match parse_resolution_body(&body) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    match state.engine.scheduler().submit_vote(market, outcome).await {
        Ok(tx_hash) => Json(json!({
            "success": true,
            "transactionHash": tx_hash,
            "message": format!("Vote submitted for market {market}"),
        }))
        .into_response(),
        Err(e) => resolution_error_response(&e),
    }
}
