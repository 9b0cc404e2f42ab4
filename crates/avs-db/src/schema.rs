//! SQL schema definitions.

/// Schema v1: committed rounds.
///
/// `round_id`, `prediction` and `salt` are 32-byte big-endian words
/// (`prediction` in two's complement), so BLOB ordering on `round_id` is
/// numeric ordering. The CHECKs pin both storage class and width, since a
/// 32-character TEXT value also has `length` 32.
pub const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS rounds (
    round_id BLOB PRIMARY KEY
        CHECK (typeof(round_id) = 'blob' AND length(round_id) = 32),
    prediction BLOB NOT NULL
        CHECK (typeof(prediction) = 'blob' AND length(prediction) = 32),
    salt BLOB NOT NULL CHECK (typeof(salt) = 'blob' AND length(salt) = 32),
    commit_tx BLOB
        CHECK (commit_tx IS NULL OR (typeof(commit_tx) = 'blob' AND length(commit_tx) = 32)),
    committed_at INTEGER NOT NULL,
    reveal_tx BLOB
        CHECK (reveal_tx IS NULL OR (typeof(reveal_tx) = 'blob' AND length(reveal_tx) = 32)),
    revealed_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_rounds_pending
    ON rounds(committed_at) WHERE revealed_at IS NULL;
"#;
