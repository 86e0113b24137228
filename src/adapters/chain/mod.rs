//! Chain Adapters - alloy-rs Implementations of the Chain Ports
//!
//! - `provider`: RPC connection management (type-erased alloy provider)
//! - `abi`: `sol!` bindings for the factory, market, and oracle contracts
//! - `reader`: `ChainReader` implementation (logs + view batches)
//! - `oracle`: `ResolutionSubmitter` implementation (signer-backed)

pub mod abi;
pub mod oracle;
pub mod provider;
pub mod reader;

pub use oracle::OracleSubmitter;
pub use provider::RpcProvider;
pub use reader::ContractReader;
