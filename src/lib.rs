pub mod cli;
pub mod data;
pub mod dataset;
pub mod explain;
pub mod io_utils;
pub mod join;
pub mod reconstruct;
pub mod render;
pub mod score;
pub mod sketch;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, PreviewArgs, RankArgs, ReconstructArgs},
    dataset::{CandidatePool, Table},
    reconstruct::Reconstruction,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_lineage", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Reconstruct(args) => handle_reconstruct(&args),
        Commands::Rank(args) => handle_rank(&args),
        Commands::Preview(args) => handle_preview(&args),
    }
}

fn handle_reconstruct(args: &ReconstructArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let source = Table::load(&args.source, args.delimiter, encoding)?;
    let derived = Table::load(&args.derived, args.delimiter, encoding)?;
    let pool = CandidatePool::load_dir(&args.candidates, args.delimiter, encoding)?;
    info!(
        "Reconstructing '{}' from '{}' with join key '{}' over {} candidate(s)",
        derived.name(),
        source.name(),
        args.key,
        pool.len()
    );

    match reconstruct::reconstruct(&source, &derived, &pool, &args.key, args.num_perm)? {
        Reconstruction::NoTransformation => {
            println!("No transformation detected: the derived table adds no columns.");
        }
        Reconstruction::Reconstructed {
            ranking,
            explanation,
        } => {
            if let Some(runner_up) = ranking.get(1) {
                debug!(
                    "Runner-up candidate '{}' (fused {:.4})",
                    runner_up.name, runner_up.fused_score
                );
            }
            explain::save_json(&explanation, &args.output)
                .with_context(|| format!("Writing explanation to {:?}", args.output))?;
            info!("Explanation written to {:?}", args.output);
            println!("{}", explanation.narrative);
        }
    }
    Ok(())
}

fn handle_rank(args: &RankArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let source = Table::load(&args.source, args.delimiter, encoding)?;
    let derived = Table::load(&args.derived, args.delimiter, encoding)?;
    let pool = CandidatePool::load_dir(&args.candidates, args.delimiter, encoding)?;

    let Some(scored) =
        reconstruct::rank_candidates(&source, &derived, &pool, &args.key, args.num_perm)?
    else {
        println!("No transformation detected: the derived table adds no columns.");
        return Ok(());
    };

    let headers = vec![
        "candidate".to_string(),
        "schema".to_string(),
        "value".to_string(),
        "fused".to_string(),
    ];
    let rows = scored
        .ranking
        .iter()
        .map(|candidate| {
            vec![
                candidate.name.clone(),
                format!("{:.4}", candidate.schema_score),
                format!("{:.4}", candidate.value_score),
                format!("{:.4}", candidate.fused_score),
            ]
        })
        .collect::<Vec<_>>();
    render::print_table(&headers, &rows);
    info!(
        "Ranked {} candidate(s) for added attribute(s): {}",
        scored.ranking.len(),
        scored.added_attributes.join(", ")
    );
    Ok(())
}

fn handle_preview(args: &PreviewArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let table = Table::load(&args.input, args.delimiter, encoding)?;
    let shown = table.rows().iter().take(args.rows).cloned().collect::<Vec<_>>();
    render::print_table(table.headers(), &shown);
    info!("Displayed {} row(s) from {:?}", shown.len(), args.input);
    Ok(())
}
