//! Uniswap v3 style pool reads.

use std::sync::Arc;

use alloy::sol_types::SolCall;
use alloy_primitives::{Address, U256};

use crate::abi::{decode_error, IUniswapV3Pool};
use crate::{ChainError, ChainReader, Result};

/// Read-only handle to a pool contract.
#[derive(Clone)]
pub struct UniswapPool {
    address: Address,
    reader: Arc<dyn ChainReader>,
}

impl UniswapPool {
    pub fn new(address: Address, reader: Arc<dyn ChainReader>) -> Self {
        Self { address, reader }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Current `sqrtPriceX96` from `slot0()`.
    pub async fn sqrt_price_x96(&self) -> Result<U256> {
        let data = IUniswapV3Pool::slot0Call {}.abi_encode();
        let out = self.reader.call(self.address, data.into()).await?;
        let slot0 = IUniswapV3Pool::slot0Call::abi_decode_returns(&out)
            .map_err(|e| decode_error("slot0", e))?;
        Ok(U256::from(slot0.sqrtPriceX96))
    }

    /// Cumulative ticks at each of `seconds_agos`, in request order.
    pub async fn tick_cumulatives(&self, seconds_agos: &[u32]) -> Result<Vec<i64>> {
        let call = IUniswapV3Pool::observeCall {
            secondsAgos: seconds_agos.to_vec(),
        };
        let out = self.reader.call(self.address, call.abi_encode().into()).await?;
        let observed = IUniswapV3Pool::observeCall::abi_decode_returns(&out)
            .map_err(|e| decode_error("observe", e))?;

        if observed.tickCumulatives.len() != seconds_agos.len() {
            return Err(ChainError::Decode {
                method: "observe",
                reason: format!(
                    "expected {} tick cumulatives, got {}",
                    seconds_agos.len(),
                    observed.tickCumulatives.len()
                ),
            });
        }

        observed
            .tickCumulatives
            .into_iter()
            .map(|tick| {
                i64::try_from(tick).map_err(|_| ChainError::Decode {
                    method: "observe",
                    reason: "tick cumulative outside int56".to_string(),
                })
            })
            .collect()
    }
}
