//! # avs-oracle
//!
//! Price reads and the next-period price predictor.
//!
//! A [`PriceSource`](source::PriceSource) produces one
//! [`PriceObservation`](avs_types::PriceObservation) per round (base price plus
//! short and long window average ticks); the [`predictor`] turns it into a
//! drift-adjusted Q64.96 prediction.
//!
//! ## Modules
//!
//! - [`predictor`] — drift and next-price computation (exact integer math)
//! - [`tick`] — tick TWAP and `sqrtPriceX96` conversions
//! - [`reader`] — pool-level reads: spot price and window TWAP tick
//! - [`source`] — aggregator, direct-pool and static price sources

pub mod predictor;
pub mod reader;
pub mod source;
pub mod tick;

use alloy_primitives::I256;
use avs_chain::ChainError;

pub use predictor::{drift_bps, predict, predict_next, Prediction};
pub use reader::PoolOracle;
pub use source::{AggregatorSource, PoolSource, PriceSource, StaticSource, TwapWindows};

/// Error types for price reads and prediction.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Base price is zero or negative.
    #[error("invalid base price: {0}")]
    InvalidBase(I256),

    /// Drift sensitivity outside `[0, 10000]` basis points.
    #[error("alpha must be within [0, 10000] bps, got {0}")]
    InvalidAlpha(i64),

    /// The prediction does not fit in an `int256`.
    #[error("prediction overflows int256")]
    PredictionOverflow,

    /// A TWAP window of zero seconds.
    #[error("TWAP window must be non-zero")]
    ZeroWindow,

    /// The price source could not be read or returned malformed data.
    #[error("price read failed: {0}")]
    ReadFailure(#[from] ChainError),
}

/// Convenience result type for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;
