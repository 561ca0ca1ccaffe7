use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::sketch::DEFAULT_NUM_PERM;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reconstruct lost join transformations between CSV datasets",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconstruct the join that produced a derived table and write a JSON explanation
    Reconstruct(ReconstructArgs),
    /// Score and rank candidate tables without verifying a join
    Rank(RankArgs),
    /// Preview the first few rows of a CSV file in a formatted table
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct ReconstructArgs {
    /// Source (base) table; use '-' to read from stdin
    #[arg(short = 's', long = "source")]
    pub source: PathBuf,
    /// Derived (joined) table whose provenance should be reconstructed
    #[arg(short = 'd', long = "derived")]
    pub derived: PathBuf,
    /// Directory holding the candidate tables
    #[arg(short = 'c', long = "candidates")]
    pub candidates: PathBuf,
    /// Join key column shared by the source and the candidates
    #[arg(short = 'k', long = "key")]
    pub key: String,
    /// Destination for the JSON explanation record (overwritten each run)
    #[arg(short = 'o', long = "output", default_value = "results/reconstruction.json")]
    pub output: PathBuf,
    /// Min-hash permutation count used for similarity estimates
    #[arg(long = "num-perm", default_value_t = DEFAULT_NUM_PERM)]
    pub num_perm: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct RankArgs {
    /// Source (base) table; use '-' to read from stdin
    #[arg(short = 's', long = "source")]
    pub source: PathBuf,
    /// Derived (joined) table whose provenance should be reconstructed
    #[arg(short = 'd', long = "derived")]
    pub derived: PathBuf,
    /// Directory holding the candidate tables
    #[arg(short = 'c', long = "candidates")]
    pub candidates: PathBuf,
    /// Join key column shared by the source and the candidates
    #[arg(short = 'k', long = "key")]
    pub key: String,
    /// Min-hash permutation count used for similarity estimates
    #[arg(long = "num-perm", default_value_t = DEFAULT_NUM_PERM)]
    pub num_perm: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Input CSV file to preview
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding for input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
