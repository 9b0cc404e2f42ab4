//! Price observations read from a pool or aggregator.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// One snapshot of the price source, taken right before a prediction.
///
/// Never persisted; only the prediction derived from it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Base price in Q64.96 (long-window TWAP or spot).
    pub base_x96: U256,
    /// Average tick over the short window.
    pub short_tick: i64,
    /// Average tick over the long window.
    pub long_tick: i64,
}

impl PriceObservation {
    pub fn new(base_x96: U256, short_tick: i64, long_tick: i64) -> Self {
        Self {
            base_x96,
            short_tick,
            long_tick,
        }
    }
}
