//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the use-case layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ChainReader`: read-only chain access (head block, logs, views)
//! - `ResolutionSubmitter`: privileged oracle transactions

pub mod chain_reader;
pub mod resolution;

pub use chain_reader::{ChainEvent, ChainReader, MarketInfo, PoolState};
pub use resolution::{ResolutionError, ResolutionSubmitter};
