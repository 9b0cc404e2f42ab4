//! Round query functions.

use alloy_primitives::{B256, I256, U256};
use avs_types::{RoundId, RoundRecord, TxHash};
use rusqlite::{params, Connection, Row};

use crate::{DbError, Result};

const COLUMNS: &str =
    "round_id, prediction, salt, commit_tx, committed_at, reveal_tx, revealed_at";

/// A `rounds` row as SQLite returns it, before width checks.
struct RawRound {
    round_id: Vec<u8>,
    prediction: Vec<u8>,
    salt: Vec<u8>,
    commit_tx: Option<Vec<u8>>,
    committed_at: i64,
    reveal_tx: Option<Vec<u8>>,
    revealed_at: Option<i64>,
}

impl RawRound {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            round_id: row.get(0)?,
            prediction: row.get(1)?,
            salt: row.get(2)?,
            commit_tx: row.get(3)?,
            committed_at: row.get(4)?,
            reveal_tx: row.get(5)?,
            revealed_at: row.get(6)?,
        })
    }

    fn decode(self) -> Result<RoundRecord> {
        let hash = |column: &str, bytes: Option<Vec<u8>>| -> Result<Option<TxHash>> {
            bytes
                .map(|b| word(column, &b).map(B256::from))
                .transpose()
        };
        Ok(RoundRecord {
            round_id: U256::from_be_bytes(word("round_id", &self.round_id)?),
            prediction_x96: I256::from_be_bytes(word("prediction", &self.prediction)?),
            salt: B256::from(word("salt", &self.salt)?),
            commit_tx: hash("commit_tx", self.commit_tx)?,
            committed_at: timestamp_from_sql("committed_at", self.committed_at)?,
            reveal_tx: hash("reveal_tx", self.reveal_tx)?,
            revealed_at: self
                .revealed_at
                .map(|at| timestamp_from_sql("revealed_at", at))
                .transpose()?,
        })
    }
}

fn word(column: &str, bytes: &[u8]) -> Result<[u8; 32]> {
    bytes.try_into().map_err(|_| {
        DbError::Corrupt(format!(
            "{column}: expected 32 bytes, found {}",
            bytes.len()
        ))
    })
}

/// Map row-read errors, treating a column of the wrong storage class as a
/// corrupt record rather than a database failure.
fn read_error(e: rusqlite::Error) -> DbError {
    match e {
        rusqlite::Error::InvalidColumnType(_, column, ty) => {
            DbError::Corrupt(format!("{column}: unexpected storage class {ty}"))
        }
        rusqlite::Error::FromSqlConversionFailure(idx, ty, err) => {
            DbError::Corrupt(format!("column {idx} ({ty}): {err}"))
        }
        other => DbError::Sqlite(other),
    }
}

fn key(round_id: RoundId) -> Vec<u8> {
    round_id.to_be_bytes::<32>().to_vec()
}

fn timestamp_to_sql(at: u64) -> Result<i64> {
    i64::try_from(at).map_err(|_| DbError::Constraint(format!("timestamp {at} out of range")))
}

fn timestamp_from_sql(column: &str, at: i64) -> Result<u64> {
    u64::try_from(at).map_err(|_| DbError::Corrupt(format!("{column}: negative timestamp {at}")))
}

/// Insert a new round. Fails with [`DbError::Constraint`] if the round
/// already has a record.
pub fn insert(conn: &Connection, record: &RoundRecord) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO rounds ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
        params![
            key(record.round_id),
            record.prediction_x96.to_be_bytes::<32>().to_vec(),
            record.salt.as_slice(),
            record.commit_tx.map(|tx| tx.to_vec()),
            timestamp_to_sql(record.committed_at)?,
            record.reveal_tx.map(|tx| tx.to_vec()),
            record.revealed_at.map(timestamp_to_sql).transpose()?,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(format!("round {} already stored", record.round_id))
        }
        other => DbError::Sqlite(other),
    })?;
    Ok(())
}

/// Get a round by id.
pub fn get(conn: &Connection, round_id: RoundId) -> Result<RoundRecord> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM rounds WHERE round_id = ?1"),
        [key(round_id)],
        RawRound::from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("round {round_id}")),
        other => read_error(other),
    })?
    .decode()
}

/// Record the reveal of a committed round.
///
/// A round is revealed at most once; a second call fails with
/// [`DbError::Constraint`].
pub fn mark_revealed(
    conn: &Connection,
    round_id: RoundId,
    reveal_tx: TxHash,
    revealed_at: u64,
) -> Result<()> {
    let changed = conn.execute(
        "UPDATE rounds SET reveal_tx = ?2, revealed_at = ?3
         WHERE round_id = ?1 AND revealed_at IS NULL",
        params![key(round_id), reveal_tx.as_slice(), timestamp_to_sql(revealed_at)?],
    )?;
    if changed == 0 {
        // Distinguish a missing round from a closed one.
        get(conn, round_id)?;
        return Err(DbError::Constraint(format!(
            "round {round_id} already revealed"
        )));
    }
    Ok(())
}

/// All rounds, lowest id first.
pub fn list(conn: &Connection) -> Result<Vec<RoundRecord>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM rounds ORDER BY round_id"))?;
    let rows = stmt
        .query_map([], RawRound::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(read_error)?;
    rows.into_iter().map(RawRound::decode).collect()
}
