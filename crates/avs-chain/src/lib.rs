//! # avs-chain
//!
//! Chain-client collaborator for the operator.
//!
//! Everything above this crate sees the chain through two capabilities:
//!
//! - [`ChainReader`]: read-only `eth_call` against a contract.
//! - [`ChainWriter`]: sign and send a transaction, returning its hash.
//!
//! ## Modules
//!
//! - [`abi`] — Solidity bindings for the pool, aggregator and AVS manager
//! - [`pool`] — Uniswap v3 style pool reads (`slot0`, `observe`)
//! - [`aggregator`] — on-chain TWAP aggregator reads
//! - [`avs`] — AVS manager `commit` / `reveal` submissions
//! - [`rpc`] — alloy-backed JSON-RPC client
//! - [`mock`] — in-process chain double for tests and dry runs

pub mod abi;
pub mod aggregator;
pub mod avs;
pub mod mock;
pub mod pool;
pub mod rpc;

use std::time::Duration;

use alloy_primitives::{Address, Bytes, TxHash};

pub use aggregator::PriceAggregator;
pub use avs::AvsManager;
pub use pool::UniswapPool;
pub use rpc::RpcClient;

/// Error types for chain access.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Client construction failed (bad URL, bad address).
    #[error("invalid chain configuration: {0}")]
    Config(String),

    /// Transport or node-side failure.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// The request did not complete within the configured deadline.
    #[error("rpc request timed out after {0:?}")]
    Timeout(Duration),

    /// The node answered with data that does not decode as the expected ABI type.
    #[error("malformed {method} response: {reason}")]
    Decode {
        /// Contract method whose output failed to decode.
        method: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// A submission was requested but no signing key is configured.
    #[error("no signing key configured")]
    NoSigner,

    /// The signing key could not be loaded.
    #[error("signing error: {0}")]
    Signing(String),

    /// The transaction was refused before inclusion.
    #[error("transaction rejected: {0}")]
    Rejected(String),
}

/// Convenience result type for chain operations.
pub type Result<T> = std::result::Result<T, ChainError>;

/// Read-only contract calls.
#[async_trait::async_trait]
pub trait ChainReader: Send + Sync {
    /// Execute `data` against `to` without creating a transaction.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;
}

/// Signed transaction submission.
///
/// Implementations build a fresh signing authority (operator key bound to
/// the chain id) for every submission; callers never hold key material.
#[async_trait::async_trait]
pub trait ChainWriter: Send + Sync {
    /// Sign and broadcast a call to `to`, returning the transaction hash.
    async fn submit(&self, to: Address, data: Bytes) -> Result<TxHash>;
}
