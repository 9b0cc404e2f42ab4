//! Round state store.
//!
//! The coordinator only sees [`RoundStore`]; the operator binary uses
//! [`SqliteRoundStore`], tests use [`MemoryRoundStore`].

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use avs_types::{RoundId, RoundRecord, TxHash};
use rusqlite::Connection;

use crate::{queries, DbError, Result};

/// Durable `roundId -> (prediction, salt)` mapping.
///
/// Calls are synchronous so that a write can follow a chain submission
/// with no suspension point in between.
pub trait RoundStore: Send + Sync {
    /// Persist a freshly committed round.
    ///
    /// Fails with [`DbError::Constraint`] if the round is already stored.
    fn put(&self, record: &RoundRecord) -> Result<()>;

    /// Exactly what was put, or [`DbError::NotFound`].
    fn get(&self, round_id: RoundId) -> Result<RoundRecord>;

    /// Close a round after its reveal was accepted.
    fn mark_revealed(&self, round_id: RoundId, reveal_tx: TxHash, revealed_at: u64)
        -> Result<()>;

    /// Every stored round, lowest id first.
    fn list(&self) -> Result<Vec<RoundRecord>>;
}

/// SQLite-backed store.
pub struct SqliteRoundStore {
    conn: Mutex<Connection>,
}

impl SqliteRoundStore {
    /// Open (creating and migrating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "opening round store");
        Ok(Self {
            conn: Mutex::new(crate::open(path)?),
        })
    }

    pub fn open_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(crate::open_memory()?),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RoundStore for SqliteRoundStore {
    fn put(&self, record: &RoundRecord) -> Result<()> {
        queries::rounds::insert(&self.conn(), record)
    }

    fn get(&self, round_id: RoundId) -> Result<RoundRecord> {
        queries::rounds::get(&self.conn(), round_id)
    }

    fn mark_revealed(
        &self,
        round_id: RoundId,
        reveal_tx: TxHash,
        revealed_at: u64,
    ) -> Result<()> {
        queries::rounds::mark_revealed(&self.conn(), round_id, reveal_tx, revealed_at)
    }

    fn list(&self) -> Result<Vec<RoundRecord>> {
        queries::rounds::list(&self.conn())
    }
}

/// In-process store with the same semantics as [`SqliteRoundStore`].
#[derive(Default)]
pub struct MemoryRoundStore {
    rounds: Mutex<BTreeMap<RoundId, RoundRecord>>,
}

impl MemoryRoundStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rounds(&self) -> MutexGuard<'_, BTreeMap<RoundId, RoundRecord>> {
        self.rounds.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RoundStore for MemoryRoundStore {
    fn put(&self, record: &RoundRecord) -> Result<()> {
        let mut rounds = self.rounds();
        if rounds.contains_key(&record.round_id) {
            return Err(DbError::Constraint(format!(
                "round {} already stored",
                record.round_id
            )));
        }
        rounds.insert(record.round_id, record.clone());
        Ok(())
    }

    fn get(&self, round_id: RoundId) -> Result<RoundRecord> {
        self.rounds()
            .get(&round_id)
            .cloned()
            .ok_or_else(|| DbError::NotFound(format!("round {round_id}")))
    }

    fn mark_revealed(
        &self,
        round_id: RoundId,
        reveal_tx: TxHash,
        revealed_at: u64,
    ) -> Result<()> {
        let mut rounds = self.rounds();
        let record = rounds
            .get_mut(&round_id)
            .ok_or_else(|| DbError::NotFound(format!("round {round_id}")))?;
        if record.is_revealed() {
            return Err(DbError::Constraint(format!(
                "round {round_id} already revealed"
            )));
        }
        record.reveal_tx = Some(reveal_tx);
        record.revealed_at = Some(revealed_at);
        Ok(())
    }

    fn list(&self) -> Result<Vec<RoundRecord>> {
        Ok(self.rounds().values().cloned().collect())
    }
}
