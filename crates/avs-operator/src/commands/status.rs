//! Status command: stored round records.

use std::fmt::Write as _;

use avs_db::{DbError, RoundStore};
use avs_types::{RoundId, RoundRecord};

use super::Report;

fn line(out: &mut String, record: &RoundRecord) -> std::fmt::Result {
    write!(
        out,
        "round {:<6} {:<9} prediction_x96={}",
        record.round_id,
        record.phase(),
        record.prediction_x96
    )?;
    if let Some(tx) = record.commit_tx {
        write!(out, " commit_tx={tx}")?;
    }
    if let Some(tx) = record.reveal_tx {
        write!(out, " reveal_tx={tx}")?;
    }
    writeln!(out)
}

/// Show one round, or every stored round.
pub fn status(store: &dyn RoundStore, round_id: Option<RoundId>) -> anyhow::Result<Report> {
    let records = match round_id {
        Some(id) => match store.get(id) {
            Ok(record) => vec![record],
            Err(DbError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        },
        None => store.list()?,
    };

    let mut text = String::new();
    if records.is_empty() {
        text.push_str("no stored rounds");
    }
    for record in &records {
        line(&mut text, record)?;
    }

    Ok(Report {
        json: serde_json::to_value(&records)?,
        text: text.trim_end().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, I256, U256};
    use avs_db::MemoryRoundStore;

    fn store_with_rounds() -> MemoryRoundStore {
        let store = MemoryRoundStore::new();
        for n in [1u64, 2] {
            let record = RoundRecord::committed(
                U256::from(n),
                I256::try_from(n as i64 * 1_000).expect("i256"),
                B256::repeat_byte(n as u8),
                Some(B256::repeat_byte(0xc0)),
                1_700_000_000,
            );
            store.put(&record).expect("put");
        }
        store
            .mark_revealed(U256::from(2u64), B256::repeat_byte(0xd0), 1_700_000_015)
            .expect("reveal");
        store
    }

    #[test]
    fn test_status_lists_all_rounds() {
        let report = status(&store_with_rounds(), None).expect("status");
        assert_eq!(report.json.as_array().map(Vec::len), Some(2));
        assert!(report.text.contains("committed"));
        assert!(report.text.contains("revealed"));
        assert_eq!(report.text.lines().count(), 2);
    }

    #[test]
    fn test_status_single_round() {
        let report = status(&store_with_rounds(), Some(U256::from(2u64))).expect("status");
        assert_eq!(report.json.as_array().map(Vec::len), Some(1));
        assert!(report.text.contains("reveal_tx="));
    }

    #[test]
    fn test_status_unknown_round() {
        let report = status(&MemoryRoundStore::new(), Some(U256::from(7u64))).expect("status");
        assert_eq!(report.text, "no stored rounds");
        assert_eq!(report.json, serde_json::json!([]));
    }
}
