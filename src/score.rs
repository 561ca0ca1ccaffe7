//! Candidate scoring: schema similarity, value similarity, and score fusion.
//!
//! Scoring runs in two stages. The schema scorer is a coarse filter over
//! column names: candidates missing the join key, or sharing no added
//! attribute by name, are dropped outright. The value scorer then compares
//! actual column contents for the survivors, which dominates the pipeline's
//! cost. Fused scores weight content similarity above name overlap.

use log::debug;

use crate::{
    dataset::{CandidatePool, Table},
    reconstruct::ReconstructError,
    sketch::MinHashSketch,
};

pub const SCHEMA_WEIGHT: f64 = 0.40;
pub const VALUE_WEIGHT: f64 = 0.60;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub name: String,
    pub schema_score: f64,
    pub value_score: f64,
    pub fused_score: f64,
}

/// Names of added attributes a candidate actually carries.
pub fn common_attributes(candidate: &Table, added: &[String]) -> Vec<String> {
    added
        .iter()
        .filter(|attr| candidate.has_column(attr))
        .cloned()
        .collect()
}

/// Scores every eligible candidate by column-name similarity against the
/// added-attribute set. Candidates lacking the join key, or sharing no added
/// attribute by name, are withheld entirely; every emitted score is strictly
/// positive. Output preserves pool enumeration order.
pub fn schema_scores(
    added: &[String],
    pool: &CandidatePool,
    join_key: &str,
    num_perm: usize,
) -> Vec<(String, f64)> {
    let added_sketch = MinHashSketch::build(added.iter().map(String::as_str), num_perm);
    let mut scores = Vec::new();
    for candidate in pool.iter() {
        if !candidate.has_column(join_key) {
            debug!(
                "Skipping candidate '{}': no join key column '{}'",
                candidate.name(),
                join_key
            );
            continue;
        }
        if common_attributes(candidate, added).is_empty() {
            debug!(
                "Skipping candidate '{}': shares no added attribute",
                candidate.name()
            );
            continue;
        }
        let name_sketch =
            MinHashSketch::build(candidate.headers().iter().map(String::as_str), num_perm);
        let score = added_sketch.jaccard(&name_sketch);
        if score > 0.0 {
            debug!("Candidate '{}' schema score {:.4}", candidate.name(), score);
            scores.push((candidate.name().to_string(), score));
        }
    }
    scores
}

/// Scores the schema-filtered candidates by content similarity: for each
/// added attribute, the best match over the candidate's non-key columns, the
/// per-attribute maxima summed and scaled by
/// (added-attribute-count / non-key-column-count). A candidate whose only
/// column is the join key scores 0.0.
pub fn value_scores(
    derived: &Table,
    added: &[String],
    pool: &CandidatePool,
    schema_scores: &[(String, f64)],
    join_key: &str,
    num_perm: usize,
) -> Vec<(String, f64)> {
    let attr_sketches: Vec<MinHashSketch> = added
        .iter()
        .map(|attr| {
            let index = derived
                .column_index(attr)
                .expect("added attribute comes from the derived header row");
            column_sketch(derived, index, num_perm)
        })
        .collect();

    let mut scores = Vec::with_capacity(schema_scores.len());
    for (name, _) in schema_scores {
        let candidate = pool
            .get(name)
            .expect("schema scorer only emits pool members");
        let non_key_columns: Vec<usize> = (0..candidate.headers().len())
            .filter(|&idx| candidate.headers()[idx] != join_key)
            .collect();
        if non_key_columns.is_empty() {
            debug!("Candidate '{name}' has only the join key column; value score 0");
            scores.push((name.clone(), 0.0));
            continue;
        }
        let column_sketches: Vec<MinHashSketch> = non_key_columns
            .iter()
            .map(|&idx| column_sketch(candidate, idx, num_perm))
            .collect();

        let summed: f64 = attr_sketches
            .iter()
            .map(|attr_sketch| {
                column_sketches
                    .iter()
                    .map(|col_sketch| attr_sketch.jaccard(col_sketch))
                    .fold(0.0, f64::max)
            })
            .sum();
        let score = summed * added.len() as f64 / non_key_columns.len() as f64;
        debug!("Candidate '{name}' value score {score:.4}");
        scores.push((name.clone(), score));
    }
    scores
}

/// Fuses schema and value scores into one descending ranking. Ties keep pool
/// enumeration order. Errors when the two inputs cover different candidates.
pub fn fuse_scores(
    schema: &[(String, f64)],
    value: &[(String, f64)],
) -> Result<Vec<RankedCandidate>, ReconstructError> {
    let schema_keys: Vec<&str> = schema.iter().map(|(n, _)| n.as_str()).collect();
    let value_keys: Vec<&str> = value.iter().map(|(n, _)| n.as_str()).collect();
    if schema_keys != value_keys {
        return Err(ReconstructError::ScoreKeyMismatch {
            schema: schema_keys.join(", "),
            value: value_keys.join(", "),
        });
    }

    let mut ranking: Vec<RankedCandidate> = schema
        .iter()
        .zip(value.iter())
        .map(|((name, schema_score), (_, value_score))| RankedCandidate {
            name: name.clone(),
            schema_score: *schema_score,
            value_score: *value_score,
            fused_score: SCHEMA_WEIGHT * schema_score + VALUE_WEIGHT * value_score,
        })
        .collect();
    ranking.sort_by(|a, b| b.fused_score.total_cmp(&a.fused_score));
    Ok(ranking)
}

fn column_sketch(table: &Table, index: usize, num_perm: usize) -> MinHashSketch {
    let values = table.canonical_column(index);
    MinHashSketch::build(values.iter().filter(|v| !v.is_empty()), num_perm)
}
