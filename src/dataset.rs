//! In-memory tables and candidate-pool loading.
//!
//! A [`Table`] is an ordered header row plus a row-major grid of raw string
//! cells, identified by its file name. Tables are immutable once loaded;
//! every transformation in the pipeline produces a new table.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{data::canonical_value, io_utils};

#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let name = name.into();
        for (idx, header) in headers.iter().enumerate() {
            if headers[..idx].contains(header) {
                return Err(anyhow!(
                    "Table '{name}' declares column '{header}' more than once"
                ));
            }
        }
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(anyhow!(
                    "Table '{name}' row {} has {} field(s), expected {}",
                    row_idx + 1,
                    row.len(),
                    headers.len()
                ));
            }
        }
        Ok(Self { name, headers, rows })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Canonicalized values of one column, nulls rendered as empty strings.
    pub fn canonical_column(&self, index: usize) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| canonical_value(&row[index]))
            .collect()
    }

    /// Loads a table from a CSV/TSV file; `-` reads from stdin.
    pub fn load(path: &Path, delimiter: Option<u8>, encoding: &'static Encoding) -> Result<Self> {
        let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter, true)?;
        let headers = io_utils::reader_headers(&mut reader, encoding)
            .with_context(|| format!("Reading header row of {path:?}"))?;

        let mut rows = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record = record.with_context(|| format!("Reading row {} of {path:?}", row_idx + 2))?;
            let decoded = io_utils::decode_record(&record, encoding)?;
            rows.push(decoded);
        }

        let name = if io_utils::is_dash(path) {
            "stdin".to_string()
        } else {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        };
        debug!("Loaded '{}': {} row(s), {} column(s)", name, rows.len(), headers.len());
        Table::new(name, headers, rows)
    }
}

/// The candidate pool: every table in a directory, loaded once per run and
/// fixed for the duration of that run. Enumeration order is sorted file name
/// order, which doubles as the stable tie-break order for ranking.
#[derive(Debug)]
pub struct CandidatePool {
    tables: Vec<Table>,
}

impl CandidatePool {
    pub fn load_dir(
        dir: &Path,
        delimiter: Option<u8>,
        encoding: &'static Encoding,
    ) -> Result<Self> {
        let mut paths = Vec::new();
        let entries =
            std::fs::read_dir(dir).with_context(|| format!("Reading candidate directory {dir:?}"))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("Listing candidate directory {dir:?}"))?
                .path();
            let is_tabular = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("tsv")
                });
            if path.is_file() && is_tabular {
                paths.push(path);
            }
        }
        paths.sort();

        let mut tables = Vec::with_capacity(paths.len());
        for path in &paths {
            tables.push(Table::load(path, delimiter, encoding)?);
        }
        info!("Loaded {} candidate table(s) from {dir:?}", tables.len());
        Ok(Self { tables })
    }

    pub fn from_tables(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Added attributes: columns of the derived table absent from the source.
/// Preserves the derived table's column order.
pub fn added_attributes(source: &Table, derived: &Table) -> Vec<String> {
    derived
        .headers()
        .iter()
        .filter(|h| !source.has_column(h))
        .cloned()
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

    #[test]
    fn new_rejects_duplicate_headers_and_ragged_rows() {
        let duplicated = Table::new(
            "bad.csv",
            vec!["id".to_string(), "id".to_string()],
            Vec::new(),
        );
        assert!(duplicated.is_err());

        let ragged = Table::new(
            "bad.csv",
            vec!["id".to_string(), "name".to_string()],
            vec![vec!["1".to_string()]],
        );
        assert!(ragged.is_err());
    }

    #[test]
    fn canonical_column_renders_nulls_as_empty() {
        let t = table("t.csv", &["id", "score"], &[&["1", "10.0"], &["2", ""]]);
        assert_eq!(t.canonical_column(1), vec!["10".to_string(), String::new()]);
    }

    #[test]
    fn added_attributes_preserve_derived_order() {
        let source = table("base.csv", &["id", "name"], &[]);
        let derived = table("joined.csv", &["id", "name", "date", "score"], &[]);
        assert_eq!(added_attributes(&source, &derived), vec!["date", "score"]);
        assert!(added_attributes(&source, &source).is_empty());
    }
}
