//! Round lifecycle types.
//!
//! A round moves through
//! `Idle -> Committing -> Committed -> Revealing -> Revealed`, with `Failed`
//! reachable from either submitting phase. The persisted [`RoundRecord`] is
//! what survives between the commit and the reveal invocation.

use std::fmt;

use alloy_primitives::{TxHash, I256};
use serde::{Deserialize, Serialize};

use crate::{RoundId, Salt};

/// Phase of a single commit-reveal round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Idle,
    Committing,
    Committed,
    Revealing,
    Revealed,
    Failed,
}

impl RoundPhase {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: RoundPhase) -> bool {
        use RoundPhase::*;
        matches!(
            (self, next),
            (Idle, Committing)
                | (Committing, Committed)
                | (Committing, Failed)
                | (Committed, Revealing)
                | (Revealing, Revealed)
                | (Revealing, Failed)
        )
    }

    /// `Revealed` and `Failed` accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, RoundPhase::Revealed | RoundPhase::Failed)
    }

    /// Advance to `next`, rejecting illegal transitions.
    pub fn transition(self, next: RoundPhase) -> Result<RoundPhase, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoundPhase::Idle => "idle",
            RoundPhase::Committing => "committing",
            RoundPhase::Committed => "committed",
            RoundPhase::Revealing => "revealing",
            RoundPhase::Revealed => "revealed",
            RoundPhase::Failed => "failed",
        };
        f.pad(s)
    }
}

/// An illegal phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid round transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: RoundPhase,
    pub to: RoundPhase,
}

/// Durable state of a committed round.
///
/// `prediction_x96` and `salt` are exactly the values hashed into the
/// on-chain commitment; the reveal must send them back unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round_id: RoundId,
    pub prediction_x96: I256,
    pub salt: Salt,
    /// Commit transaction hash.
    pub commit_tx: Option<TxHash>,
    /// Unix seconds.
    pub committed_at: u64,
    pub reveal_tx: Option<TxHash>,
    pub revealed_at: Option<u64>,
}

impl RoundRecord {
    /// A freshly committed round that has not been revealed.
    pub fn committed(
        round_id: RoundId,
        prediction_x96: I256,
        salt: Salt,
        commit_tx: Option<TxHash>,
        committed_at: u64,
    ) -> Self {
        Self {
            round_id,
            prediction_x96,
            salt,
            commit_tx,
            committed_at,
            reveal_tx: None,
            revealed_at: None,
        }
    }

    /// Whether the round has already been consumed by a reveal.
    pub fn is_revealed(&self) -> bool {
        self.revealed_at.is_some()
    }

    /// The phase this record represents.
    pub fn phase(&self) -> RoundPhase {
        if self.is_revealed() {
            RoundPhase::Revealed
        } else {
            RoundPhase::Committed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, U256};

    #[test]
    fn test_happy_path_transitions() {
        let phase = RoundPhase::Idle
            .transition(RoundPhase::Committing)
            .and_then(|p| p.transition(RoundPhase::Committed))
            .and_then(|p| p.transition(RoundPhase::Revealing))
            .and_then(|p| p.transition(RoundPhase::Revealed))
            .expect("happy path");
        assert_eq!(phase, RoundPhase::Revealed);
        assert!(phase.is_terminal());
    }

    #[test]
    fn test_failed_reachable_only_from_submitting_phases() {
        assert!(RoundPhase::Committing.can_transition_to(RoundPhase::Failed));
        assert!(RoundPhase::Revealing.can_transition_to(RoundPhase::Failed));
        assert!(!RoundPhase::Idle.can_transition_to(RoundPhase::Failed));
        assert!(!RoundPhase::Committed.can_transition_to(RoundPhase::Failed));
        assert!(!RoundPhase::Revealed.can_transition_to(RoundPhase::Failed));
    }

    #[test]
    fn test_cannot_skip_commit() {
        let err = RoundPhase::Idle
            .transition(RoundPhase::Revealing)
            .expect_err("reveal before commit");
        assert_eq!(err.from, RoundPhase::Idle);
        assert_eq!(err.to, RoundPhase::Revealing);
        assert_eq!(err.to_string(), "invalid round transition: idle -> revealing");
    }

    #[test]
    fn test_terminal_phases_are_final() {
        for next in [
            RoundPhase::Idle,
            RoundPhase::Committing,
            RoundPhase::Committed,
            RoundPhase::Revealing,
        ] {
            assert!(!RoundPhase::Revealed.can_transition_to(next));
            assert!(!RoundPhase::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn test_record_phase() {
        let mut record = RoundRecord::committed(
            U256::from(7u64),
            I256::try_from(-5i64).expect("i256"),
            B256::repeat_byte(0xab),
            None,
            1_700_000_000,
        );
        assert_eq!(record.phase(), RoundPhase::Committed);
        assert!(!record.is_revealed());

        record.revealed_at = Some(1_700_000_015);
        assert_eq!(record.phase(), RoundPhase::Revealed);
    }

    #[test]
    fn test_record_json_keeps_prediction_sign() {
        let record = RoundRecord::committed(
            U256::from(1u64),
            I256::MIN,
            B256::ZERO,
            None,
            0,
        );
        let json = serde_json::to_string(&record).expect("serialize");
        let back: RoundRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, record);
    }
}
