//! Drift-adjusted next-period price prediction.
//!
//! ```text
//! drift_bps  = short_tick - long_tick
//! prediction = base_x96 * (1e8 + alpha_bps * drift_bps) / 1e8
//! ```
//!
//! One tick is roughly one basis point of price, and `alpha_bps` is itself in
//! basis points, so their product is scaled by `1e4 * 1e4 = 1e8`. Everything
//! is computed on arbitrary-precision integers; the final division truncates
//! toward zero.

use alloy_primitives::{I256, U256};
use avs_types::{PriceObservation, BPS_PER_UNIT};
use num_bigint::{BigInt, Sign};
use serde::{Deserialize, Serialize};

use crate::{OracleError, Result};

/// Denominator of the adjustment factor (`1e4 * 1e4`).
pub const ADJUSTMENT_SCALE: i64 = BPS_PER_UNIT * BPS_PER_UNIT;

/// Largest accepted drift sensitivity (100%).
pub const MAX_ALPHA_BPS: i64 = BPS_PER_UNIT;

/// A prediction together with the inputs it was derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub observation: PriceObservation,
    pub drift_bps: i128,
    pub alpha_bps: i64,
    /// Predicted price in Q64.96.
    pub prediction_x96: I256,
}

/// Basis-point drift between the short and long window ticks.
///
/// Positive when the short-window price is above the long-window price.
/// Computed in 128 bits, so any pair of `i64` ticks is accepted.
pub fn drift_bps(short_tick: i64, long_tick: i64) -> i128 {
    i128::from(short_tick) - i128::from(long_tick)
}

/// Apply `alpha_bps` of `drift_bps` to `base_x96`.
///
/// # Errors
///
/// - [`OracleError::InvalidBase`] if `base_x96` is zero or negative
/// - [`OracleError::InvalidAlpha`] if `alpha_bps` is outside `[0, 10000]`
/// - [`OracleError::PredictionOverflow`] if the result does not fit in `int256`
///
/// # Examples
///
/// ```
/// use alloy_primitives::I256;
/// use avs_oracle::predictor::predict_next;
///
/// let one = I256::try_from(1u128 << 96).unwrap();
/// // Zero drift leaves the price unchanged.
/// assert_eq!(predict_next(one, 0, 200).unwrap(), one);
/// ```
pub fn predict_next(base_x96: I256, drift_bps: i128, alpha_bps: i64) -> Result<I256> {
    if !base_x96.is_positive() {
        return Err(OracleError::InvalidBase(base_x96));
    }
    apply_drift(&i256_to_big(base_x96), drift_bps, alpha_bps)
}

/// Predict the next price from a full observation.
pub fn predict(observation: &PriceObservation, alpha_bps: i64) -> Result<Prediction> {
    if observation.base_x96.is_zero() {
        return Err(OracleError::InvalidBase(I256::ZERO));
    }
    let drift = drift_bps(observation.short_tick, observation.long_tick);
    let prediction_x96 = apply_drift(&u256_to_big(observation.base_x96), drift, alpha_bps)?;

    tracing::debug!(
        base_x96 = %observation.base_x96,
        drift_bps = drift,
        alpha_bps,
        prediction_x96 = %prediction_x96,
        "prediction computed"
    );

    Ok(Prediction {
        observation: *observation,
        drift_bps: drift,
        alpha_bps,
        prediction_x96,
    })
}

fn apply_drift(base: &BigInt, drift_bps: i128, alpha_bps: i64) -> Result<I256> {
    if !(0..=MAX_ALPHA_BPS).contains(&alpha_bps) {
        return Err(OracleError::InvalidAlpha(alpha_bps));
    }
    let scale = BigInt::from(ADJUSTMENT_SCALE);
    let adjustment = &scale + BigInt::from(alpha_bps) * BigInt::from(drift_bps);
    // num-bigint division truncates toward zero.
    let predicted = base * adjustment / scale;
    big_to_i256(&predicted).ok_or(OracleError::PredictionOverflow)
}

fn i256_to_big(value: I256) -> BigInt {
    BigInt::from_signed_bytes_be(&value.to_be_bytes::<32>())
}

fn u256_to_big(value: U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}

fn big_to_i256(value: &BigInt) -> Option<I256> {
    let bytes = value.to_signed_bytes_be();
    if bytes.len() > 32 {
        return None;
    }
    let fill = if value.sign() == Sign::Minus { 0xff } else { 0x00 };
    let mut word = [fill; 32];
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    Some(I256::from_be_bytes(word))
}
