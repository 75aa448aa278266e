use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;

use t20_win_predictor::config::{AppConfig, load_dotenv};
use t20_win_predictor::dataset;
use t20_win_predictor::logging::init_tracing;

/// Turn a directory of ball-by-ball match files into one per-delivery feature table.
#[derive(Debug, Parser)]
#[command(name = "build_features")]
struct Args {
    /// Directory of `*.json` match files (default: T20_MATCHES_DIR or `t20s_json`).
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output table, `.csv` or `.xlsx` (default: T20_FEATURE_TABLE or `t20_data.csv`).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Extraction threads; 1 runs sequentially (default: T20_JOBS or 1).
    #[arg(long)]
    jobs: Option<usize>,

    #[arg(long, env = "T20_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = AppConfig::from_env();
    let input = args.input.unwrap_or(config.matches_dir);
    let output = args.output.unwrap_or(config.feature_table);
    let jobs = args.jobs.unwrap_or(config.jobs).max(1);
    if !input.is_dir() {
        return Err(anyhow!("input {} is not a directory", input.display()));
    }

    let summary = dataset::build_feature_table(&input, &output, jobs)?;

    println!("Feature build complete");
    println!("Output: {}", summary.output.display());
    println!(
        "Matches: {}/{}",
        summary.files_succeeded, summary.files_total
    );
    println!("Rows written: {}", summary.rows_written);
    println!("Started: {}", summary.started_at);
    println!("Finished: {}", summary.finished_at);
    if !summary.errors.is_empty() {
        println!("Skipped: {}", summary.errors.len());
        for err in summary.errors.iter().take(8) {
            println!(" - {err}");
        }
    }

    Ok(())
}
