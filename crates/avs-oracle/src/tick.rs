//! Tick and square-root price conversions.
//!
//! A pool's oracle records a running sum of the active tick. The average
//! tick over the last `w` seconds is
//!
//! ```text
//! (tickCumulative(now) - tickCumulative(now - w)) / w
//! ```
//!
//! and the instantaneous Q64.96 price is `sqrtPriceX96^2 >> 96`.

use alloy_primitives::U256;
use avs_chain::ChainError;
use avs_types::Q96_BITS;
use num_bigint::BigUint;

use crate::{OracleError, Result};

/// Average tick between two cumulative observations `window_secs` apart.
///
/// Integer division truncates toward zero.
///
/// # Errors
///
/// - [`OracleError::ZeroWindow`] if `window_secs` is zero
/// - [`OracleError::ReadFailure`] if the average does not fit in an `i64`
pub fn twap_tick(start_cumulative: i64, now_cumulative: i64, window_secs: u32) -> Result<i64> {
    if window_secs == 0 {
        return Err(OracleError::ZeroWindow);
    }
    let delta = i128::from(now_cumulative) - i128::from(start_cumulative);
    let average = delta / i128::from(window_secs);
    i64::try_from(average).map_err(|_| {
        OracleError::ReadFailure(ChainError::Decode {
            method: "observe",
            reason: format!("average tick {average} out of range"),
        })
    })
}

/// Q64.96 price from a Q64.96 square-root price.
///
/// # Errors
///
/// - [`OracleError::ReadFailure`] if the squared price does not fit in 256 bits
pub fn spot_price_from_sqrt(sqrt_price_x96: U256) -> Result<U256> {
    let sqrt = BigUint::from_bytes_be(&sqrt_price_x96.to_be_bytes::<32>());
    let price: BigUint = (&sqrt * &sqrt) >> Q96_BITS;
    U256::try_from_be_slice(&price.to_bytes_be()).ok_or_else(|| {
        OracleError::ReadFailure(ChainError::Decode {
            method: "slot0",
            reason: "sqrtPriceX96 squared exceeds 256 bits".to_string(),
        })
    })
}
