//! In-process chain double.
//!
//! [`MockChain`] answers read calls from registered handlers keyed by
//! contract address and 4-byte selector, and records every submission. It
//! backs the unit tests of the crates above this one and the integration
//! test suite.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use alloy_primitives::{keccak256, Address, Bytes, TxHash, U256};

use crate::{ChainError, ChainReader, ChainWriter, Result};

type Handler = Arc<dyn Fn(&[u8]) -> Result<Bytes> + Send + Sync>;

/// A transaction accepted by [`MockChain`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub to: Address,
    pub data: Bytes,
    pub tx_hash: TxHash,
}

#[derive(Default)]
struct MockState {
    handlers: HashMap<(Address, [u8; 4]), Handler>,
    submissions: Vec<Submission>,
    unreachable: bool,
    reject_reason: Option<String>,
}

/// Scriptable chain reader/writer.
#[derive(Default, Clone)]
pub struct MockChain {
    state: Arc<Mutex<MockState>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Answer calls to `to` whose calldata starts with `selector`.
    pub fn on_call<F>(&self, to: Address, selector: [u8; 4], handler: F)
    where
        F: Fn(&[u8]) -> Result<Bytes> + Send + Sync + 'static,
    {
        self.lock().handlers.insert((to, selector), Arc::new(handler));
    }

    /// Make every read fail as if the node were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    /// Reject every submission with `reason`, or accept again with `None`.
    pub fn reject_submissions(&self, reason: Option<&str>) {
        self.lock().reject_reason = reason.map(str::to_string);
    }

    /// All accepted submissions, oldest first.
    pub fn submissions(&self) -> Vec<Submission> {
        self.lock().submissions.clone()
    }
}

#[async_trait::async_trait]
impl ChainReader for MockChain {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let handler = {
            let state = self.lock();
            if state.unreachable {
                return Err(ChainError::Rpc("connection refused".to_string()));
            }
            let selector: [u8; 4] = data
                .get(..4)
                .and_then(|s| s.try_into().ok())
                .ok_or_else(|| ChainError::Rpc("calldata shorter than a selector".to_string()))?;
            state
                .handlers
                .get(&(to, selector))
                .cloned()
                .ok_or_else(|| ChainError::Rpc(format!("execution reverted: no handler at {to}")))?
        };
        handler(&data)
    }
}

#[async_trait::async_trait]
impl ChainWriter for MockChain {
    async fn submit(&self, to: Address, data: Bytes) -> Result<TxHash> {
        let mut state = self.lock();
        if let Some(reason) = &state.reject_reason {
            return Err(ChainError::Rejected(reason.clone()));
        }
        let nonce = U256::from(state.submissions.len());
        let mut preimage = nonce.to_be_bytes::<32>().to_vec();
        preimage.extend_from_slice(&data);
        let tx_hash = keccak256(&preimage);
        state.submissions.push(Submission { to, data, tx_hash });
        Ok(tx_hash)
    }
}

/// ABI-encode a single `uint256` return value.
pub fn encode_uint(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes::<32>().to_vec())
}

/// ABI-encode `slot0()` outputs with only `sqrtPriceX96` set.
pub fn encode_slot0(sqrt_price_x96: U256) -> Bytes {
    let mut out = sqrt_price_x96.to_be_bytes::<32>().to_vec();
    out.extend_from_slice(&[0u8; 32 * 6]);
    out.into()
}

/// ABI-encode `observe()` outputs with zeroed liquidity accumulators.
pub fn encode_observe(tick_cumulatives: &[i64]) -> Bytes {
    let n = tick_cumulatives.len();
    let word = |v: U256| v.to_be_bytes::<32>();
    let mut out = Vec::with_capacity(32 * (4 + 2 * n));
    out.extend_from_slice(&word(U256::from(0x40u64)));
    out.extend_from_slice(&word(U256::from(0x40 + 32 * (n + 1))));
    out.extend_from_slice(&word(U256::from(n)));
    for tick in tick_cumulatives {
        // Two's complement sign extension to 256 bits.
        let fill = if *tick < 0 { u64::MAX } else { 0 };
        out.extend_from_slice(&word(U256::from_limbs([*tick as u64, fill, fill, fill])));
    }
    out.extend_from_slice(&word(U256::from(n)));
    out.resize(out.len() + 32 * n, 0);
    out.into()
}
