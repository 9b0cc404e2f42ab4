//! # avs-protocol
//!
//! Commit-reveal protocol for one prediction round.
//!
//! ## Modules
//!
//! - [`commitment`] — salt generation and `keccak256(prediction ‖ salt)`
//! - [`coordinator`] — the round state machine driving commit and reveal

pub mod commitment;
pub mod coordinator;

use avs_chain::ChainError;
use avs_db::DbError;
use avs_oracle::OracleError;
use avs_types::{InvalidTransition, RoundId};

pub use commitment::{commitment, generate_salt, verify_commitment};
pub use coordinator::{CommittedRound, RoundCoordinator, RoundOutcome};

/// Error types for a commit-reveal round.
#[derive(Debug, thiserror::Error)]
pub enum RoundError {
    /// Price read or prediction failed; nothing was submitted.
    #[error("prediction failed: {0}")]
    Oracle(#[from] OracleError),

    /// A commit or reveal transaction was rejected or never sent.
    #[error("{action} submission failed for round {round_id}: {source}")]
    SubmissionFailure {
        round_id: RoundId,
        action: &'static str,
        #[source]
        source: ChainError,
    },

    /// Reveal requested for a round with no stored commitment.
    #[error("no committed state for round {0}")]
    StateNotFound(RoundId),

    /// Stored state for the round cannot be decoded.
    #[error("committed state for round {round_id} is corrupt: {reason}")]
    StateCorrupt { round_id: RoundId, reason: String },

    /// A submission succeeded but its local record was not written.
    #[error("round {round_id}: {action} landed but state was not persisted: {source}")]
    PersistenceFailure {
        round_id: RoundId,
        action: &'static str,
        #[source]
        source: DbError,
    },

    #[error("round {0} is already committed")]
    AlreadyCommitted(RoundId),

    #[error("round {0} is already revealed")]
    AlreadyRevealed(RoundId),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// Any other store failure.
    #[error("round store error: {0}")]
    Store(#[from] DbError),
}

/// Convenience result type for round operations.
pub type Result<T> = std::result::Result<T, RoundError>;
