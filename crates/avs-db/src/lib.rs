//! # avs-db
//!
//! Durable round state for the operator: one SQLite file at
//! `$AVS_DATA_DIR/rounds.db` holding the prediction and salt of every
//! committed round until it is revealed.
//!
//! ## Schema
//!
//! - WAL mode
//! - Fixed-width BLOB columns for every 256-bit value, guarded by
//!   `CHECK(length(..) = 32)`
//! - All timestamps are Unix epoch seconds
//! - Schema version stored in `PRAGMA user_version`

pub mod migrations;
pub mod queries;
pub mod schema;
pub mod store;

use rusqlite::Connection;
use std::path::Path;

pub use store::{MemoryRoundStore, RoundStore, SqliteRoundStore};

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database file name inside the data directory.
pub const DB_FILE_NAME: &str = "rounds.db";

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    /// A stored value does not have the width its column promises.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the round database at the given path.
///
/// Configures WAL mode and runs any pending migrations.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
///
/// `synchronous = FULL`: a committed round must survive power loss, not
/// just a process crash.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = FULL;",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_memory() {
        let conn = open_memory().expect("open in-memory db");
        let version: u32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("get user_version");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_wal_mode_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let conn = open(&dir.path().join(DB_FILE_NAME)).expect("open");
        let mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .expect("get journal_mode");
        assert_eq!(mode, "wal");
    }
}
