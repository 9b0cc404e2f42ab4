//! Commitment scheme.
//!
//! `commitment = keccak256(int256BE(prediction) ‖ salt)` over exactly 64
//! bytes, matching Solidity's `keccak256(abi.encodePacked(int256, bytes32))`.

use alloy_primitives::{keccak256, B256, I256};
use avs_types::{Commitment, Salt};
use rand::RngCore;

/// Fresh 32-byte salt from the OS CSPRNG.
pub fn generate_salt() -> Salt {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    B256::from(bytes)
}

/// The 64-byte packed preimage.
pub fn preimage(prediction_x96: I256, salt: Salt) -> [u8; 64] {
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&prediction_x96.to_be_bytes::<32>());
    out[32..].copy_from_slice(salt.as_slice());
    out
}

pub fn commitment(prediction_x96: I256, salt: Salt) -> Commitment {
    keccak256(preimage(prediction_x96, salt))
}

/// Whether `(prediction_x96, salt)` opens `expected`.
pub fn verify_commitment(expected: Commitment, prediction_x96: I256, salt: Salt) -> bool {
    commitment(prediction_x96, salt) == expected
}
