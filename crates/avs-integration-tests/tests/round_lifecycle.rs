//! Integration test: full commit-reveal rounds.
//!
//! Wires the real price sources, predictor, coordinator and round stores
//! to an in-process chain:
//! - a pool answering `slot0` / `observe` with average ticks 50 (30s) and
//!   40 (300s)
//! - an aggregator answering `twapPriceX96` with `2^96`
//! - an AVS manager that stores commit hashes and accepts a reveal only if
//!   `keccak256(int256 prediction ‖ bytes32 salt)` matches

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::sol_types::SolCall;
use alloy_primitives::{keccak256, Address, Bytes, TxHash, B256, I256, U256};
use avs_chain::abi::{IPredictionAvs, IPriceAggregator, IUniswapV3Pool};
use avs_chain::mock::{encode_observe, encode_slot0, encode_uint, MockChain};
use avs_chain::{AvsManager, ChainError, ChainWriter};
use avs_db::{MemoryRoundStore, RoundStore, SqliteRoundStore, DB_FILE_NAME};
use avs_oracle::source::from_addresses;
use avs_oracle::{OracleError, TwapWindows};
use avs_protocol::{RoundCoordinator, RoundError};
use avs_types::{RoundPhase, Q96};

const POOL: Address = Address::repeat_byte(0x88);
const AGGREGATOR: Address = Address::repeat_byte(0xa9);
const AVS: Address = Address::repeat_byte(0xa5);

/// Alpha used by the operator by default.
const ALPHA_BPS: i64 = 200;

/// `2^96 * (1e8 + 200 * 10) / 1e8`
const EXPECTED_PREDICTION: &str = "79229747077514622880295821215";

// =========================================================
// In-process AVS manager
// =========================================================

#[derive(Default)]
struct AvsState {
    commitments: HashMap<U256, B256>,
    revealed: HashMap<U256, (I256, B256)>,
    transactions: u64,
}

/// Contract double enforcing the commit-reveal rules on chain.
#[derive(Default, Clone)]
struct MockAvsManager {
    state: Arc<Mutex<AvsState>>,
}

impl MockAvsManager {
    fn revealed(&self, round: U256) -> Option<(I256, B256)> {
        self.state.lock().expect("avs state").revealed.get(&round).copied()
    }

    fn commitment(&self, round: U256) -> Option<B256> {
        self.state.lock().expect("avs state").commitments.get(&round).copied()
    }

    fn transactions(&self) -> u64 {
        self.state.lock().expect("avs state").transactions
    }
}

fn reject(reason: &str) -> ChainError {
    ChainError::Rejected(format!("execution reverted: {reason}"))
}

#[async_trait::async_trait]
impl ChainWriter for MockAvsManager {
    async fn submit(&self, to: Address, data: Bytes) -> avs_chain::Result<TxHash> {
        if to != AVS {
            return Err(reject("not the AVS manager"));
        }
        let mut state = self.state.lock().expect("avs state");

        if data.starts_with(&IPredictionAvs::commitCall::SELECTOR) {
            let call = IPredictionAvs::commitCall::abi_decode(&data)
                .map_err(|e| reject(&e.to_string()))?;
            if state.commitments.contains_key(&call.roundId) {
                return Err(reject("already committed"));
            }
            state.commitments.insert(call.roundId, call.commitHash);
        } else if data.starts_with(&IPredictionAvs::revealCall::SELECTOR) {
            let call = IPredictionAvs::revealCall::abi_decode(&data)
                .map_err(|e| reject(&e.to_string()))?;
            let expected = *state
                .commitments
                .get(&call.roundId)
                .ok_or_else(|| reject("no commitment"))?;
            if state.revealed.contains_key(&call.roundId) {
                return Err(reject("already revealed"));
            }
            // abi.encodePacked(int256, bytes32)
            let mut packed = call.predictionX96.to_be_bytes::<32>().to_vec();
            packed.extend_from_slice(call.salt.as_slice());
            if keccak256(&packed) != expected {
                return Err(reject("commitment mismatch"));
            }
            state
                .revealed
                .insert(call.roundId, (call.predictionX96, call.salt));
        } else {
            return Err(reject("unknown selector"));
        }

        state.transactions += 1;
        Ok(keccak256(state.transactions.to_be_bytes()))
    }
}

// =========================================================
// Pool and aggregator
// =========================================================

/// Pool with average tick 50 over 30s and 40 over 300s.
fn mock_chain(sqrt_price_x96: U256) -> MockChain {
    let chain = MockChain::new();
    chain.on_call(POOL, IUniswapV3Pool::slot0Call::SELECTOR, move |_| {
        Ok(encode_slot0(sqrt_price_x96))
    });
    chain.on_call(POOL, IUniswapV3Pool::observeCall::SELECTOR, |data| {
        let call = IUniswapV3Pool::observeCall::abi_decode(data)
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        let now = -4_200_000i64;
        let cumulatives: Vec<i64> = call
            .secondsAgos
            .iter()
            .map(|&ago| {
                let ago = i64::from(ago);
                let avg = if ago <= 30 { 50 } else { 40 };
                now - avg * ago
            })
            .collect();
        Ok(encode_observe(&cumulatives))
    });
    chain.on_call(AGGREGATOR, IPriceAggregator::twapPriceX96Call::SELECTOR, |_| {
        Ok(encode_uint(Q96))
    });
    chain
}

fn coordinator(
    chain: &MockChain,
    avs: &MockAvsManager,
    store: Arc<dyn RoundStore>,
    aggregator: Option<Address>,
) -> RoundCoordinator {
    let windows = TwapWindows::new(30, 300).expect("windows");
    let source = from_addresses(Arc::new(chain.clone()), POOL, aggregator, windows);
    RoundCoordinator::new(
        Arc::from(source),
        AvsManager::new(AVS, Arc::new(avs.clone())),
        store,
    )
    .with_alpha_bps(ALPHA_BPS)
    .with_reveal_delay(Duration::from_millis(10))
}

fn expected_prediction() -> I256 {
    I256::from_dec_str(EXPECTED_PREDICTION).expect("prediction")
}

// =========================================================
// Tests
// =========================================================

#[tokio::test]
async fn aggregator_round_commits_and_reveals() {
    let chain = mock_chain(Q96);
    let avs = MockAvsManager::default();
    let store = Arc::new(MemoryRoundStore::new());
    let coordinator = coordinator(&chain, &avs, store.clone(), Some(AGGREGATOR));
    let round = U256::from(1u64);

    let outcome = coordinator.run(round).await.expect("round");

    // Prediction: drift 10 bps at alpha 200.
    assert_eq!(outcome.committed.prediction.drift_bps, 10);
    assert_eq!(outcome.committed.record.prediction_x96, expected_prediction());

    // The contract saw the same commitment the coordinator computed.
    assert_eq!(avs.commitment(round), Some(outcome.committed.commitment));

    // Reveal carried exactly the persisted values and verified on chain.
    let (revealed_prediction, revealed_salt) = avs.revealed(round).expect("revealed");
    let stored = store.get(round).expect("stored");
    assert_eq!(revealed_prediction, stored.prediction_x96);
    assert_eq!(revealed_salt, stored.salt);
    assert_eq!(stored.phase(), RoundPhase::Revealed);
    assert_eq!(avs.transactions(), 2);
}

#[tokio::test]
async fn pool_round_uses_spot_price() {
    // sqrtPriceX96 = 2^96 gives spot price 2^96
    let chain = mock_chain(Q96);
    let avs = MockAvsManager::default();
    let coordinator = coordinator(&chain, &avs, Arc::new(MemoryRoundStore::new()), None);

    let committed = coordinator.commit(U256::from(2u64)).await.expect("commit");
    assert_eq!(committed.prediction.observation.base_x96, Q96);
    assert_eq!(committed.record.prediction_x96, expected_prediction());
}

#[tokio::test]
async fn reveal_in_later_process_reads_sqlite_state() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join(DB_FILE_NAME);
    let chain = mock_chain(Q96);
    let avs = MockAvsManager::default();
    let round = U256::from(77u64);

    // First invocation: commit only.
    let committed = {
        let store = Arc::new(SqliteRoundStore::open(&db_path).expect("open"));
        coordinator(&chain, &avs, store, Some(AGGREGATOR))
            .commit(round)
            .await
            .expect("commit")
    };

    // Second invocation: fresh store handle, reveal only.
    let store = Arc::new(SqliteRoundStore::open(&db_path).expect("reopen"));
    let reopened = store.get(round).expect("persisted");
    assert_eq!(reopened.prediction_x96, committed.record.prediction_x96);
    assert_eq!(reopened.salt, committed.record.salt);

    let revealed = coordinator(&chain, &avs, store.clone(), Some(AGGREGATOR))
        .reveal(round)
        .await
        .expect("reveal");
    assert!(revealed.is_revealed());
    assert_eq!(
        avs.revealed(round),
        Some((committed.record.prediction_x96, committed.record.salt))
    );

    // Third invocation: the round is closed locally.
    let again = coordinator(&chain, &avs, store, Some(AGGREGATOR))
        .reveal(round)
        .await
        .expect_err("closed");
    assert!(matches!(again, RoundError::AlreadyRevealed(_)));
    assert_eq!(avs.transactions(), 2);
}

#[tokio::test]
async fn contract_rejects_wrong_opening() {
    let avs = MockAvsManager::default();
    let manager = AvsManager::new(AVS, Arc::new(avs.clone()));
    let round = U256::from(3u64);
    let salt = B256::repeat_byte(0x11);
    let prediction = expected_prediction();

    let commitment = avs_protocol::commitment(prediction, salt);
    manager.commit(round, commitment).await.expect("commit");

    let wrong_salt = manager.reveal(round, prediction, B256::repeat_byte(0x12)).await;
    assert!(matches!(wrong_salt, Err(ChainError::Rejected(_))));

    let wrong_prediction = manager.reveal(round, prediction + I256::ONE, salt).await;
    assert!(matches!(wrong_prediction, Err(ChainError::Rejected(_))));

    manager.reveal(round, prediction, salt).await.expect("valid opening");
}

#[tokio::test]
async fn independent_operators_cannot_double_commit() {
    let chain = mock_chain(Q96);
    let avs = MockAvsManager::default();
    let round = U256::from(4u64);

    let first = coordinator(&chain, &avs, Arc::new(MemoryRoundStore::new()), None);
    let second = coordinator(&chain, &avs, Arc::new(MemoryRoundStore::new()), None);

    first.commit(round).await.expect("first commit");
    let err = second.commit(round).await.expect_err("duplicate on chain");
    assert!(matches!(err, RoundError::SubmissionFailure { action: "commit", .. }));
    assert!(matches!(
        second.store().get(round),
        Err(avs_db::DbError::NotFound(_))
    ));
}

#[tokio::test]
async fn unreachable_node_aborts_before_any_submission() {
    let chain = mock_chain(Q96);
    chain.set_unreachable(true);
    let avs = MockAvsManager::default();
    let store = Arc::new(MemoryRoundStore::new());
    let coordinator = coordinator(&chain, &avs, store.clone(), Some(AGGREGATOR));

    let err = coordinator.run(U256::from(5u64)).await.expect_err("unreachable");
    assert!(matches!(err, RoundError::Oracle(OracleError::ReadFailure(_))));
    assert_eq!(avs.transactions(), 0);
    assert!(store.list().expect("list").is_empty());
}
