use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use t20_win_predictor::config::{AppConfig, load_dotenv};
use t20_win_predictor::live::LiveSnapshot;
use t20_win_predictor::logging::init_tracing;
use t20_win_predictor::reference;

/// Score one match snapshot without the interactive form.
#[derive(Debug, Parser)]
#[command(name = "predict")]
struct Args {
    /// Snapshot JSON (fields as in the form; `overs` in cricket notation).
    #[arg(default_value = "demos/snapshot_chase.json")]
    snapshot: PathBuf,

    /// Print the live feature row as JSON as well.
    #[arg(long)]
    show_row: bool,

    #[arg(long, env = "T20_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();
    init_tracing(&args.log_level);

    let raw = fs::read_to_string(&args.snapshot)
        .with_context(|| format!("read snapshot {}", args.snapshot.display()))?;
    let snapshot: LiveSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("parse snapshot {}", args.snapshot.display()))?;

    let config = AppConfig::from_env();
    let reference = reference::init(&config)?;
    let prediction = reference.predictor.predict(&snapshot)?;

    if args.show_row {
        println!("{}", serde_json::to_string_pretty(&prediction.row)?);
    }
    println!(
        "{}: {:.2}%",
        snapshot.batting_team,
        prediction.probability.win * 100.0
    );
    println!(
        "{}: {:.2}%",
        snapshot.bowling_team,
        prediction.probability.loss * 100.0
    );
    if prediction.overridden {
        println!(
            "Settled chase (model said {:.2}%)",
            prediction.model_probability.win * 100.0
        );
    }

    Ok(())
}
