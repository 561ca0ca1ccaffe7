//! Assembly and persistence of the provenance explanation record.
//!
//! Pure assembly over upstream artifacts: no scoring or verification happens
//! here. The record is created once, serialized once as pretty JSON, and
//! overwrites any prior result at the target path.

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    dataset::Table,
    io_utils,
    join::{JoinKind, JoinMatch},
};

#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub source_table: String,
    pub derived_table: String,
    pub candidate_used: String,
    pub common_attributes_used: Vec<String>,
    pub join_type: Option<JoinKind>,
    pub dropped_columns: Vec<String>,
    pub fused_score: f64,
    pub narrative: String,
}

pub fn build_explanation(
    source: &Table,
    derived: &Table,
    candidate: &Table,
    common_attributes: &[String],
    join_match: JoinMatch,
    fused_score: f64,
    join_key: &str,
) -> Explanation {
    let dropped_columns: Vec<String> = candidate
        .headers()
        .iter()
        .filter(|column| !derived.has_column(column))
        .cloned()
        .collect();

    let narrative = match join_match.kind() {
        Some(kind) => format!(
            "The derived table '{derived}' was produced from '{source}' by joining \
             candidate table '{candidate}' on column '{join_key}'. A {kind} join \
             reproduces the derived table exactly; candidate columns dropped by the \
             final projection: {dropped}.",
            derived = derived.name(),
            source = source.name(),
            candidate = candidate.name(),
            kind = kind.as_str(),
            dropped = render_column_list(&dropped_columns),
        ),
        None => format!(
            "No supported join type reproduces '{derived}' from '{source}' and \
             candidate '{candidate}' on column '{join_key}'. The candidate is the \
             best-scoring match (fused score {fused_score:.4}), but verification is \
             inconclusive; the transformation may involve operations beyond a \
             two-way equality join.",
            derived = derived.name(),
            source = source.name(),
            candidate = candidate.name(),
        ),
    };

    Explanation {
        source_table: source.name().to_string(),
        derived_table: derived.name().to_string(),
        candidate_used: candidate.name().to_string(),
        common_attributes_used: common_attributes.to_vec(),
        join_type: join_match.kind(),
        dropped_columns,
        fused_score,
        narrative,
    }
}

pub fn save_json(explanation: &Explanation, path: &Path) -> Result<()> {
    io_utils::ensure_parent_dir(path)?;
    let file = File::create(path).with_context(|| format!("Creating result file {path:?}"))?;
    serde_json::to_writer_pretty(file, explanation).context("Writing explanation JSON")
}

fn render_column_list(columns: &[String]) -> String {
    if columns.is_empty() {
        "none".to_string()
    } else {
        columns.iter().map(|c| format!("'{c}'")).join(", ")
    }
}
