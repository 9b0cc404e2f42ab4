//! Pool-level price reads.

use alloy_primitives::U256;
use avs_chain::{ChainError, UniswapPool};

use crate::{tick, OracleError, Result};

/// Spot price and TWAP tick reads on top of a pool handle.
#[derive(Clone)]
pub struct PoolOracle {
    pool: UniswapPool,
}

impl PoolOracle {
    pub fn new(pool: UniswapPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &UniswapPool {
        &self.pool
    }

    /// Instantaneous Q64.96 price (`sqrtPriceX96^2 >> 96`).
    pub async fn spot_price_x96(&self) -> Result<U256> {
        let sqrt = self.pool.sqrt_price_x96().await?;
        tick::spot_price_from_sqrt(sqrt)
    }

    /// Average tick over the last `window_secs` seconds.
    pub async fn twap_tick(&self, window_secs: u32) -> Result<i64> {
        if window_secs == 0 {
            return Err(OracleError::ZeroWindow);
        }
        let cumulatives = self.pool.tick_cumulatives(&[window_secs, 0]).await?;
        match cumulatives.as_slice() {
            [start, now] => tick::twap_tick(*start, *now, window_secs),
            _ => Err(OracleError::ReadFailure(ChainError::Decode {
                method: "observe",
                reason: "expected two tick cumulatives".to_string(),
            })),
        }
    }
}
