//! Adapters Layer - External World Implementations
//!
//! Implements the ports over concrete transports:
//! - `chain`: alloy-rs RPC provider, ABI bindings, reader + oracle
//! - `api`: axum HTTP routes and the WebSocket endpoint
//! - `metrics`: Prometheus registry and exposition

pub mod api;
pub mod chain;
pub mod metrics;
