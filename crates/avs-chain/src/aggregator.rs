//! On-chain TWAP aggregator reads.

use std::sync::Arc;

use alloy::sol_types::SolCall;
use alloy_primitives::{Address, U256};

use crate::abi::{decode_error, IPriceAggregator};
use crate::{ChainReader, Result};

/// Read-only handle to a `twapPriceX96` aggregator.
#[derive(Clone)]
pub struct PriceAggregator {
    address: Address,
    reader: Arc<dyn ChainReader>,
}

impl PriceAggregator {
    pub fn new(address: Address, reader: Arc<dyn ChainReader>) -> Self {
        Self { address, reader }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Q64.96 TWAP over the last `window_secs` seconds.
    pub async fn twap_price_x96(&self, window_secs: u32) -> Result<U256> {
        let call = IPriceAggregator::twapPriceX96Call {
            windowSeconds: window_secs,
        };
        let out = self.reader.call(self.address, call.abi_encode().into()).await?;
        IPriceAggregator::twapPriceX96Call::abi_decode_returns(&out)
            .map_err(|e| decode_error("twapPriceX96", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{encode_uint, MockChain};
    use crate::ChainError;

    const AGG: Address = Address::repeat_byte(0xa9);

    #[tokio::test]
    async fn test_twap_price() {
        let chain = MockChain::new();
        chain.on_call(AGG, IPriceAggregator::twapPriceX96Call::SELECTOR, |data| {
            let call = IPriceAggregator::twapPriceX96Call::abi_decode(data)
                .map_err(|e| ChainError::Rpc(e.to_string()))?;
            assert_eq!(call.windowSeconds, 300);
            Ok(encode_uint(U256::from(1u8) << 96))
        });

        let agg = PriceAggregator::new(AGG, Arc::new(chain));
        let price = agg.twap_price_x96(300).await.expect("twap");
        assert_eq!(price, U256::from(1u8) << 96);
    }

    #[tokio::test]
    async fn test_read_failure_propagates() {
        let chain = MockChain::new();
        chain.set_unreachable(true);
        let agg = PriceAggregator::new(AGG, Arc::new(chain));
        let err = agg.twap_price_x96(300).await.expect_err("down");
        assert!(matches!(err, ChainError::Rpc(_)));
    }
}
