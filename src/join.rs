//! Join replay and exact-match verification.
//!
//! Reconstruction is confirmed by re-running each supported join between the
//! source and a candidate and comparing the result against the derived table.
//! Replayed joins use the standard relational column layout: left columns
//! first, then right columns minus the join key. Identity is header-sequence
//! equality plus multiset-of-rows equality on canonicalized cells; row order
//! is an engine convention, not part of the transformation.

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use serde::Serialize;

use crate::{data::canonical_value, dataset::Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Left,
    Right,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Left => "left",
            JoinKind::Right => "right",
        }
    }
}

/// Join types replayed during verification, in replay order.
pub const REPLAY_ORDER: [JoinKind; 2] = [JoinKind::Left, JoinKind::Right];

/// Verification outcome. Terminal in all three states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMatch {
    Left,
    Right,
    None,
}

impl JoinMatch {
    pub fn kind(self) -> Option<JoinKind> {
        match self {
            JoinMatch::Left => Some(JoinKind::Left),
            JoinMatch::Right => Some(JoinKind::Right),
            JoinMatch::None => None,
        }
    }
}

/// Equality join of two tables on a single shared key column.
///
/// Null keys (empty cells) never match. Unmatched rows from the outer side
/// are padded with null cells; a right join fills the key column from the
/// right table.
pub fn join(left: &Table, right: &Table, key: &str, kind: JoinKind) -> Result<Table> {
    let left_key = left
        .column_index(key)
        .ok_or_else(|| anyhow!("Join key '{key}' not found in '{}'", left.name()))?;
    let right_key = right
        .column_index(key)
        .ok_or_else(|| anyhow!("Join key '{key}' not found in '{}'", right.name()))?;

    let right_columns: Vec<usize> = (0..right.headers().len())
        .filter(|&idx| idx != right_key)
        .collect();
    let mut headers = left.headers().to_vec();
    headers.extend(right_columns.iter().map(|&idx| right.headers()[idx].clone()));

    let rows = match kind {
        JoinKind::Left => {
            let lookup = key_lookup(right, right_key);
            let mut rows = Vec::new();
            for left_row in left.rows() {
                let key_value = canonical_value(&left_row[left_key]);
                let matches = lookup_rows(&lookup, &key_value);
                if matches.is_empty() {
                    let mut combined = left_row.clone();
                    combined.extend(right_columns.iter().map(|_| String::new()));
                    rows.push(combined);
                } else {
                    for &right_idx in matches {
                        let right_row = &right.rows()[right_idx];
                        let mut combined = left_row.clone();
                        combined.extend(right_columns.iter().map(|&idx| right_row[idx].clone()));
                        rows.push(combined);
                    }
                }
            }
            rows
        }
        JoinKind::Right => {
            let lookup = key_lookup(left, left_key);
            let mut rows = Vec::new();
            for right_row in right.rows() {
                let key_value = canonical_value(&right_row[right_key]);
                let matches = lookup_rows(&lookup, &key_value);
                if matches.is_empty() {
                    let mut combined = vec![String::new(); left.headers().len()];
                    combined[left_key] = right_row[right_key].clone();
                    combined.extend(right_columns.iter().map(|&idx| right_row[idx].clone()));
                    rows.push(combined);
                } else {
                    for &left_idx in matches {
                        let mut combined = left.rows()[left_idx].clone();
                        combined.extend(right_columns.iter().map(|&idx| right_row[idx].clone()));
                        rows.push(combined);
                    }
                }
            }
            rows
        }
    };

    Table::new(format!("{}+{}", left.name(), right.name()), headers, rows)
}

/// Whether two tables are identical: same header sequence and the same
/// multiset of canonicalized rows.
pub fn tables_identical(a: &Table, b: &Table) -> bool {
    if a.headers() != b.headers() {
        return false;
    }
    let mut rows_a = canonical_rows(a);
    let mut rows_b = canonical_rows(b);
    rows_a.sort();
    rows_b.sort();
    rows_a == rows_b
}

/// Replays every supported join of source and candidate and reports the
/// first one reproducing the derived table, in [`REPLAY_ORDER`].
pub fn verify_join(
    source: &Table,
    candidate: &Table,
    derived: &Table,
    key: &str,
) -> Result<JoinMatch> {
    for kind in REPLAY_ORDER {
        let replayed = join(source, candidate, key, kind)?;
        if tables_identical(&replayed, derived) {
            return Ok(match kind {
                JoinKind::Left => JoinMatch::Left,
                JoinKind::Right => JoinMatch::Right,
            });
        }
    }
    Ok(JoinMatch::None)
}

fn key_lookup(table: &Table, key_index: usize) -> HashMap<String, Vec<usize>> {
    let mut map: HashMap<String, Vec<usize>> = HashMap::new();
    for (row_idx, row) in table.rows().iter().enumerate() {
        let key_value = canonical_value(&row[key_index]);
        if key_value.is_empty() {
            continue;
        }
        map.entry(key_value).or_default().push(row_idx);
    }
    map
}

fn lookup_rows<'a>(lookup: &'a HashMap<String, Vec<usize>>, key: &str) -> &'a [usize] {
    if key.is_empty() {
        return &[];
    }
    lookup.get(key).map(Vec::as_slice).unwrap_or(&[])
}

fn canonical_rows(table: &Table) -> Vec<Vec<String>> {
    table
        .rows()
        .iter()
        .map(|row| row.iter().map(|cell| canonical_value(cell)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            name,
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    fn base() -> Table {
        table(
            "base.csv",
            &["id", "name", "value"],
            &[
                &["1", "Alice", "10"],
                &["2", "Bob", "20"],
                &["3", "Charlie", "30"],
                &["4", "David", "40"],
                &["5", "Eva", "50"],
            ],
        )
    }

    fn calendar() -> Table {
        table(
            "calendar.csv",
            &["id", "date"],
            &[
                &["2", "2023-01-01"],
                &["3", "2023-01-02"],
                &["4", "2023-01-03"],
                &["6", "2023-01-04"],
            ],
        )
    }

    #[test]
    fn left_join_keeps_all_source_rows() {
        let joined = join(&base(), &calendar(), "id", JoinKind::Left).unwrap();
        assert_eq!(joined.headers(), &["id", "name", "value", "date"]);
        assert_eq!(joined.row_count(), 5);
        assert_eq!(joined.rows()[0], vec!["1", "Alice", "10", ""]);
        assert_eq!(joined.rows()[1], vec!["2", "Bob", "20", "2023-01-01"]);
        assert_eq!(joined.rows()[4], vec!["5", "Eva", "50", ""]);
    }

    #[test]
    fn right_join_keeps_all_candidate_rows_and_fills_key() {
        let joined = join(&base(), &calendar(), "id", JoinKind::Right).unwrap();
        assert_eq!(joined.row_count(), 4);
        assert_eq!(joined.rows()[0], vec!["2", "Bob", "20", "2023-01-01"]);
        // id 6 has no source row; left cells are null except the key.
        assert_eq!(joined.rows()[3], vec!["6", "", "", "2023-01-04"]);
    }

    #[test]
    fn duplicate_keys_fan_out() {
        let right = table(
            "tags.csv",
            &["id", "tag"],
            &[&["2", "red"], &["2", "blue"]],
        );
        let joined = join(&base(), &right, "id", JoinKind::Left).unwrap();
        assert_eq!(joined.row_count(), 6);
        assert_eq!(joined.rows()[1], vec!["2", "Bob", "20", "red"]);
        assert_eq!(joined.rows()[2], vec!["2", "Bob", "20", "blue"]);
    }

    #[test]
    fn null_keys_never_match() {
        let right = table("notes.csv", &["id", "note"], &[&["", "orphan"]]);
        let left = table("src.csv", &["id", "name"], &[&["", "Ghost"]]);
        let joined = join(&left, &right, "id", JoinKind::Left).unwrap();
        assert_eq!(joined.rows()[0], vec!["", "Ghost", ""]);
    }

    #[test]
    fn keys_match_after_canonicalization() {
        let right = table("scores.csv", &["id", "score"], &[&["2.0", "85"]]);
        let joined = join(&base(), &right, "id", JoinKind::Left).unwrap();
        assert_eq!(joined.rows()[1], vec!["2", "Bob", "20", "85"]);
    }

    #[test]
    fn join_errors_when_key_is_missing() {
        let keyless = table("keyless.csv", &["date"], &[&["2023-01-01"]]);
        assert!(join(&base(), &keyless, "id", JoinKind::Left).is_err());
    }

    #[test]
    fn verification_is_reflexive_for_left_joins() {
        let derived = join(&base(), &calendar(), "id", JoinKind::Left).unwrap();
        let outcome = verify_join(&base(), &calendar(), &derived, "id").unwrap();
        assert_eq!(outcome, JoinMatch::Left);
    }

    #[test]
    fn verification_treats_rows_as_a_multiset() {
        let derived = join(&base(), &calendar(), "id", JoinKind::Left).unwrap();
        let mut shuffled_rows = derived.rows().to_vec();
        shuffled_rows.reverse();
        let shuffled = Table::new("shuffled.csv", derived.headers().to_vec(), shuffled_rows).unwrap();
        let outcome = verify_join(&base(), &calendar(), &shuffled, "id").unwrap();
        assert_eq!(outcome, JoinMatch::Left);
    }

    #[test]
    fn verification_reports_no_match_for_altered_tables() {
        let mut rows = join(&base(), &calendar(), "id", JoinKind::Left)
            .unwrap()
            .rows()
            .to_vec();
        rows[0][1] = "Mallory".to_string();
        let derived = Table::new(
            "tampered.csv",
            vec![
                "id".to_string(),
                "name".to_string(),
                "value".to_string(),
                "date".to_string(),
            ],
            rows,
        )
        .unwrap();
        let outcome = verify_join(&base(), &calendar(), &derived, "id").unwrap();
        assert_eq!(outcome, JoinMatch::None);
    }

    #[test]
    fn right_join_result_verifies_as_right() {
        let derived = join(&base(), &calendar(), "id", JoinKind::Right).unwrap();
        let outcome = verify_join(&base(), &calendar(), &derived, "id").unwrap();
        assert_eq!(outcome, JoinMatch::Right);
    }
}
