//! # avs-types
//!
//! Shared domain types for the price-prediction AVS operator.
//!
//! Prices and predictions are Q64.96 fixed-point integers: the true value is
//! the stored integer divided by `2^96`. Round identifiers, salts and
//! commitments use the same widths as the on-chain contract (`uint256`,
//! `bytes32`, `bytes32`).

pub mod price;
pub mod round;

pub use alloy_primitives::{Address, TxHash, B256, I256, U256};
pub use price::PriceObservation;
pub use round::{InvalidTransition, RoundPhase, RoundRecord};

/// On-chain round identifier (`uint256 roundId`).
pub type RoundId = U256;

/// Per-round commitment randomness (`bytes32 salt`).
pub type Salt = B256;

/// `keccak256(int256 prediction ‖ bytes32 salt)`.
pub type Commitment = B256;

/// Fractional bits of a Q64.96 value.
pub const Q96_BITS: usize = 96;

/// 1.0 in Q64.96.
pub const Q96: U256 = U256::from_limbs([0, 1 << 32, 0, 0]);

/// Basis points per unit (1 bp = 1/10000).
pub const BPS_PER_UNIT: i64 = 10_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_q96_is_two_pow_96() {
        assert_eq!(Q96, U256::from(1u8) << Q96_BITS);
        assert_eq!(Q96.to_string(), "79228162514264337593543950336");
    }
}
