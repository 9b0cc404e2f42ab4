//! AVS manager submissions.
//!
//! The contract verifies `keccak256(abi.encodePacked(predictionX96, salt))`
//! against the stored commit hash when `reveal` lands.

use std::sync::Arc;

use alloy::sol_types::SolCall;
use alloy_primitives::{Address, Bytes, TxHash, I256};
use avs_types::{Commitment, RoundId, Salt};

use crate::abi::IPredictionAvs;
use crate::{ChainWriter, Result};

/// Write handle to the AVS manager contract.
#[derive(Clone)]
pub struct AvsManager {
    address: Address,
    writer: Arc<dyn ChainWriter>,
}

impl AvsManager {
    pub fn new(address: Address, writer: Arc<dyn ChainWriter>) -> Self {
        Self { address, writer }
    }

    /// Calldata for `commit(roundId, commitHash)`.
    pub fn commit_calldata(round_id: RoundId, commitment: Commitment) -> Bytes {
        IPredictionAvs::commitCall {
            roundId: round_id,
            commitHash: commitment,
        }
        .abi_encode()
        .into()
    }

    /// Calldata for `reveal(roundId, predictionX96, salt)`.
    pub fn reveal_calldata(round_id: RoundId, prediction_x96: I256, salt: Salt) -> Bytes {
        IPredictionAvs::revealCall {
            roundId: round_id,
            predictionX96: prediction_x96,
            salt,
        }
        .abi_encode()
        .into()
    }

    pub async fn commit(&self, round_id: RoundId, commitment: Commitment) -> Result<TxHash> {
        let data = Self::commit_calldata(round_id, commitment);
        self.writer.submit(self.address, data).await
    }

    pub async fn reveal(&self, round_id: RoundId, prediction_x96: I256, salt: Salt) -> Result<TxHash> {
        let data = Self::reveal_calldata(round_id, prediction_x96, salt);
        self.writer.submit(self.address, data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChain;
    use alloy_primitives::{B256, U256};

    #[test]
    fn test_commit_calldata_layout() {
        let data = AvsManager::commit_calldata(U256::from(1u8), B256::repeat_byte(0xcc));
        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[..4], &IPredictionAvs::commitCall::SELECTOR);
        assert_eq!(data[4 + 31], 1);
        assert_eq!(&data[36..], &[0xcc; 32]);
    }

    #[test]
    fn test_reveal_calldata_negative_prediction() {
        let data = AvsManager::reveal_calldata(U256::from(9u8), I256::MINUS_ONE, B256::ZERO);
        assert_eq!(data.len(), 4 + 32 * 3);
        assert_eq!(&data[36..68], &[0xff; 32]);

        let decoded = IPredictionAvs::revealCall::abi_decode(&data).expect("decode");
        assert_eq!(decoded.roundId, U256::from(9u8));
        assert_eq!(decoded.predictionX96, I256::MINUS_ONE);
        assert_eq!(decoded.salt, B256::ZERO);
    }

    #[tokio::test]
    async fn test_submissions_target_manager() {
        let chain = MockChain::new();
        let manager_addr = Address::repeat_byte(0x11);
        let avs = AvsManager::new(manager_addr, Arc::new(chain.clone()));

        avs.commit(U256::from(3u8), B256::repeat_byte(1)).await.expect("commit");
        avs.reveal(U256::from(3u8), I256::ONE, B256::repeat_byte(2))
            .await
            .expect("reveal");

        let subs = chain.submissions();
        assert_eq!(subs.len(), 2);
        assert!(subs.iter().all(|s| s.to == manager_addr));
        assert_eq!(&subs[0].data[..4], &IPredictionAvs::commitCall::SELECTOR);
        assert_eq!(&subs[1].data[..4], &IPredictionAvs::revealCall::SELECTOR);
    }
}
