//! Round coordinator.
//!
//! Drives one round through
//! `Idle -> Committing -> Committed -> Revealing -> Revealed`:
//!
//! 1. Read prices and predict. Any failure here aborts before the chain is
//!    touched.
//! 2. Generate a salt, submit `commit(roundId, keccak256(prediction ‖ salt))`.
//! 3. Persist `(prediction, salt)` right after the commit is accepted. There
//!    is no await between the two, so cancelling the round future cannot
//!    leave a commit without its record.
//! 4. After the reveal delay (or in a later process), read the record back
//!    and submit `reveal(roundId, prediction, salt)`.
//!
//! The coordinator never sees key material: the [`AvsManager`]'s writer
//! signs every submission.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use avs_chain::AvsManager;
use avs_db::{DbError, RoundStore};
use avs_oracle::{Prediction, PriceSource};
use avs_types::{Commitment, RoundId, RoundPhase, RoundRecord};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::commitment::{commitment, generate_salt};
use crate::{Result, RoundError};

/// Default drift sensitivity in basis points.
pub const DEFAULT_ALPHA_BPS: i64 = 200;

/// Default wait between commit and reveal.
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_secs(15);

/// A round whose commitment is on chain and persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CommittedRound {
    pub record: RoundRecord,
    pub prediction: Prediction,
    pub commitment: Commitment,
}

/// A full commit-then-reveal round.
#[derive(Debug, Clone, Serialize)]
pub struct RoundOutcome {
    pub committed: CommittedRound,
    pub revealed: RoundRecord,
}

/// Phase bookkeeping for one round, logging every transition.
struct PhaseTracker {
    round_id: RoundId,
    phase: RoundPhase,
}

impl PhaseTracker {
    fn new(round_id: RoundId, phase: RoundPhase) -> Self {
        Self { round_id, phase }
    }

    fn advance(&mut self, next: RoundPhase) -> Result<()> {
        let from = self.phase;
        self.phase = from.transition(next)?;
        info!(round = %self.round_id, %from, to = %next, "round transition");
        Ok(())
    }

    /// Move to `Failed` and hand back `err`.
    fn fail(&mut self, err: RoundError) -> RoundError {
        match self.advance(RoundPhase::Failed) {
            Ok(()) => err,
            Err(transition) => transition,
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Runs commit-reveal rounds against one AVS manager.
pub struct RoundCoordinator {
    source: Arc<dyn PriceSource>,
    avs: AvsManager,
    store: Arc<dyn RoundStore>,
    alpha_bps: i64,
    reveal_delay: Duration,
}

impl RoundCoordinator {
    pub fn new(source: Arc<dyn PriceSource>, avs: AvsManager, store: Arc<dyn RoundStore>) -> Self {
        Self {
            source,
            avs,
            store,
            alpha_bps: DEFAULT_ALPHA_BPS,
            reveal_delay: DEFAULT_REVEAL_DELAY,
        }
    }

    pub fn with_alpha_bps(mut self, alpha_bps: i64) -> Self {
        self.alpha_bps = alpha_bps;
        self
    }

    pub fn with_reveal_delay(mut self, reveal_delay: Duration) -> Self {
        self.reveal_delay = reveal_delay;
        self
    }

    pub fn store(&self) -> &dyn RoundStore {
        self.store.as_ref()
    }

    /// Observe the price source and compute this round's prediction.
    ///
    /// No chain mutation and no persistence.
    pub async fn predict(&self) -> Result<Prediction> {
        let observation = self.source.observe().await?;
        let prediction = avs_oracle::predict(&observation, self.alpha_bps)?;
        info!(
            source = self.source.name(),
            drift_bps = prediction.drift_bps,
            prediction_x96 = %prediction.prediction_x96,
            "prediction ready"
        );
        Ok(prediction)
    }

    /// Predict and commit `round_id`.
    ///
    /// # Errors
    ///
    /// - [`RoundError::AlreadyCommitted`] if the store already holds the round
    /// - [`RoundError::Oracle`] if the price read or prediction fails
    /// - [`RoundError::SubmissionFailure`] if the commit is not accepted
    /// - [`RoundError::PersistenceFailure`] if the commit landed but the
    ///   record could not be written
    pub async fn commit(&self, round_id: RoundId) -> Result<CommittedRound> {
        match self.store.get(round_id) {
            Ok(_) => {
                warn!(round = %round_id, "round already committed locally");
                return Err(RoundError::AlreadyCommitted(round_id));
            }
            Err(DbError::NotFound(_)) => {}
            Err(DbError::Corrupt(_)) => return Err(RoundError::AlreadyCommitted(round_id)),
            Err(e) => return Err(e.into()),
        }

        let prediction = self.predict().await?;

        let mut tracker = PhaseTracker::new(round_id, RoundPhase::Idle);
        tracker.advance(RoundPhase::Committing)?;

        let salt = generate_salt();
        let commitment = commitment(prediction.prediction_x96, salt);

        let commit_tx = match self.avs.commit(round_id, commitment).await {
            Ok(tx) => tx,
            Err(source) => {
                warn!(round = %round_id, error = %source, "commit submission failed");
                return Err(tracker.fail(RoundError::SubmissionFailure {
                    round_id,
                    action: "commit",
                    source,
                }));
            }
        };

        let record = RoundRecord::committed(
            round_id,
            prediction.prediction_x96,
            salt,
            Some(commit_tx),
            unix_now(),
        );
        if let Err(source) = self.store.put(&record) {
            error!(
                round = %round_id,
                commit_tx = %commit_tx,
                prediction_x96 = %record.prediction_x96,
                salt = %record.salt,
                error = %source,
                "commit landed but round state was not persisted; reveal manually with these values"
            );
            return Err(tracker.fail(RoundError::PersistenceFailure {
                round_id,
                action: "commit",
                source,
            }));
        }

        tracker.advance(RoundPhase::Committed)?;
        info!(round = %round_id, %commit_tx, %commitment, "round committed");

        Ok(CommittedRound {
            record,
            prediction,
            commitment,
        })
    }

    /// Reveal a previously committed round from its stored record.
    ///
    /// # Errors
    ///
    /// - [`RoundError::StateNotFound`] / [`RoundError::StateCorrupt`] if the
    ///   record is missing or unreadable
    /// - [`RoundError::AlreadyRevealed`] if the record is closed
    /// - [`RoundError::SubmissionFailure`] if the reveal is not accepted
    pub async fn reveal(&self, round_id: RoundId) -> Result<RoundRecord> {
        let mut tracker = PhaseTracker::new(round_id, RoundPhase::Committed);
        tracker.advance(RoundPhase::Revealing)?;

        let record = match self.store.get(round_id) {
            Ok(record) => record,
            Err(DbError::NotFound(_)) => {
                warn!(round = %round_id, "no committed state to reveal");
                return Err(tracker.fail(RoundError::StateNotFound(round_id)));
            }
            Err(DbError::Corrupt(reason)) => {
                error!(round = %round_id, %reason, "committed state is corrupt");
                return Err(tracker.fail(RoundError::StateCorrupt { round_id, reason }));
            }
            Err(e) => return Err(tracker.fail(e.into())),
        };

        if record.is_revealed() {
            warn!(round = %round_id, reveal_tx = ?record.reveal_tx, "round already revealed");
            return Err(tracker.fail(RoundError::AlreadyRevealed(round_id)));
        }

        let reveal_tx = match self
            .avs
            .reveal(round_id, record.prediction_x96, record.salt)
            .await
        {
            Ok(tx) => tx,
            Err(source) => {
                warn!(round = %round_id, error = %source, "reveal submission failed");
                return Err(tracker.fail(RoundError::SubmissionFailure {
                    round_id,
                    action: "reveal",
                    source,
                }));
            }
        };

        let revealed_at = unix_now();
        if let Err(source) = self.store.mark_revealed(round_id, reveal_tx, revealed_at) {
            error!(
                round = %round_id,
                %reveal_tx,
                error = %source,
                "reveal landed but round was not marked revealed"
            );
            return Err(tracker.fail(RoundError::PersistenceFailure {
                round_id,
                action: "reveal",
                source,
            }));
        }

        tracker.advance(RoundPhase::Revealed)?;
        info!(round = %round_id, %reveal_tx, "round revealed");

        Ok(RoundRecord {
            reveal_tx: Some(reveal_tx),
            revealed_at: Some(revealed_at),
            ..record
        })
    }

    /// Commit, wait out the reveal delay, then reveal.
    pub async fn run(&self, round_id: RoundId) -> Result<RoundOutcome> {
        let committed = self.commit(round_id).await?;
        info!(
            round = %round_id,
            delay_secs = self.reveal_delay.as_secs(),
            "waiting before reveal"
        );
        tokio::time::sleep(self.reveal_delay).await;
        let revealed = self.reveal(round_id).await?;
        Ok(RoundOutcome {
            committed,
            revealed,
        })
    }
}
