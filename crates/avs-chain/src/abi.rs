//! Solidity bindings for every contract the operator talks to.
//!
//! Only call encoding and return decoding are generated here; transport is
//! the job of [`ChainReader`](crate::ChainReader) / [`ChainWriter`](crate::ChainWriter).

use crate::ChainError;

alloy::sol! {
    /// Uniswap v3 style pool with the oracle extension.
    interface IUniswapV3Pool {
        function slot0()
            external
            view
            returns (
                uint160 sqrtPriceX96,
                int24 tick,
                uint16 observationIndex,
                uint16 observationCardinality,
                uint16 observationCardinalityNext,
                uint8 feeProtocol,
                bool unlocked
            );

        function observe(uint32[] calldata secondsAgos)
            external
            view
            returns (int56[] memory tickCumulatives, uint160[] memory secondsPerLiquidityCumulativeX128s);
    }

    /// Precomputed TWAP aggregator.
    interface IPriceAggregator {
        function twapPriceX96(uint32 windowSeconds) external view returns (uint256);
    }

    /// AVS manager accepting commit-reveal predictions.
    interface IPredictionAvs {
        function commit(uint256 roundId, bytes32 commitHash) external;
        function reveal(uint256 roundId, int256 predictionX96, bytes32 salt) external;
    }
}

/// Wrap an ABI decoding failure for `method`.
pub(crate) fn decode_error(method: &'static str, err: alloy::sol_types::Error) -> ChainError {
    ChainError::Decode {
        method,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolCall;

    #[test]
    fn test_pool_selectors() {
        assert_eq!(IUniswapV3Pool::slot0Call::SELECTOR, [0x38, 0x50, 0xc7, 0xbd]);
        assert_eq!(IUniswapV3Pool::observeCall::SELECTOR, [0x88, 0x3b, 0xdb, 0xfd]);
    }

    #[test]
    fn test_aggregator_selector() {
        assert_eq!(
            IPriceAggregator::twapPriceX96Call::SELECTOR,
            [0xdb, 0x87, 0x8a, 0x7a]
        );
    }

    #[test]
    fn test_avs_selectors() {
        assert_eq!(IPredictionAvs::commitCall::SELECTOR, [0xf2, 0xf0, 0x38, 0x77]);
        assert_eq!(IPredictionAvs::revealCall::SELECTOR, [0xc1, 0x6c, 0x2c, 0x00]);
    }
}
