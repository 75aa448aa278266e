use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use t20_win_predictor::config::{AppConfig, load_dotenv};
use t20_win_predictor::dataset;
use t20_win_predictor::logging::init_tracing;
use t20_win_predictor::venue_stats::compute_venue_stats;

/// Derive the per-venue score averages used by the live projection from a feature table.
#[derive(Debug, Parser)]
#[command(name = "venue_stats")]
struct Args {
    /// Feature table CSV (default: T20_FEATURE_TABLE or `t20_data.csv`).
    #[arg(long)]
    table: Option<PathBuf>,

    /// Venue stats CSV to write (default: T20_VENUE_STATS or `venue_stats.csv`).
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long, env = "T20_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = AppConfig::from_env();
    let table = args.table.unwrap_or(config.feature_table);
    let output = args.output.unwrap_or(config.venue_stats);

    let rows = dataset::read_table(&table)?;
    info!(rows = rows.len(), table = %table.display(), "feature table loaded");
    let stats = compute_venue_stats(&rows);
    stats.save(&output)?;

    println!("Venue stats: {} venues -> {}", stats.len(), output.display());
    Ok(())
}
