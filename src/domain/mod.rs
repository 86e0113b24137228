//! Domain layer - Core market view models.
//!
//! This module contains the pure data model for the sync engine.
//! No I/O or transport dependencies allowed here (hexagonal
//! architecture inner ring). All types are serializable and testable
//! in isolation.

pub mod events;
pub mod market;

// Re-export core types for convenience
pub use events::{BroadcastEvent, ClientCommand, ControlReply};
pub use market::{format_units, MarketSnapshot, MarketState};
