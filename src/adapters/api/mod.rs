//! API Adapter - HTTP Routes and the WebSocket Endpoint
//!
//! Serves the read API consumed by the presentation layer, the
//! admin resolution endpoints, the real-time WebSocket feed, the
//! health probe, and Prometheus exposition - all on one listener.

pub mod routes;
pub mod ws;

pub use routes::{build_router, AppState};
