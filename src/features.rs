//! Feature schema shared by the batch extractor and the live snapshot builder.
//!
//! The two producers agree on field names and formulas but not on how an inapplicable value is
//! written: batch rows leave it empty (`Option::None`), live rows carry an explicit `-1` marker
//! ([`Sentinel::NotApplicable`]). Models were trained against each convention separately, so the
//! two are kept as distinct types and never converted into one another.

use serde::{Deserialize, Serialize, Serializer};

pub const BALLS_PER_OVER: f64 = 6.0;
pub const SENTINEL_VALUE: f64 = -1.0;

/// Column order of the consolidated training table.
pub const FEATURE_COLUMNS: [&str; 14] = [
    "match_id",
    "venue",
    "toss_winner",
    "toss_decision",
    "batting_team",
    "bowling_team",
    "innings",
    "runs_so_far",
    "wickets_so_far",
    "balls_faced",
    "run_rate",
    "target_runs",
    "required_run_rate",
    "winner",
];

/// One per-delivery snapshot written to the training table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub match_id: String,
    pub venue: Option<String>,
    pub toss_winner: Option<String>,
    pub toss_decision: Option<String>,
    pub batting_team: Option<String>,
    pub bowling_team: Option<String>,
    pub innings: u32,
    pub runs_so_far: u32,
    pub wickets_so_far: u32,
    pub balls_faced: u32,
    pub run_rate: f64,
    pub target_runs: Option<u32>,
    pub required_run_rate: Option<f64>,
    pub winner: Option<String>,
}

impl FeatureRow {
    /// Cell values in [`FEATURE_COLUMNS`] order, with nulls as empty strings.
    pub fn to_cells(&self) -> Vec<String> {
        fn opt<T: ToString>(v: &Option<T>) -> String {
            v.as_ref().map(ToString::to_string).unwrap_or_default()
        }
        vec![
            self.match_id.clone(),
            opt(&self.venue),
            opt(&self.toss_winner),
            opt(&self.toss_decision),
            opt(&self.batting_team),
            opt(&self.bowling_team),
            self.innings.to_string(),
            self.runs_so_far.to_string(),
            self.wickets_so_far.to_string(),
            self.balls_faced.to_string(),
            self.run_rate.to_string(),
            opt(&self.target_runs),
            opt(&self.required_run_rate),
            opt(&self.winner),
        ]
    }
}

/// Live-side optional: either a value or the explicit "not applicable" marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sentinel<T> {
    Value(T),
    NotApplicable,
}

impl<T: Copy + Into<f64>> Sentinel<T> {
    /// Numeric form handed to the scorer; the marker becomes `-1`.
    pub fn as_model_input(&self) -> f64 {
        match self {
            Sentinel::Value(v) => (*v).into(),
            Sentinel::NotApplicable => SENTINEL_VALUE,
        }
    }
}

impl<T: Copy> Sentinel<T> {
    pub fn value(&self) -> Option<T> {
        match self {
            Sentinel::Value(v) => Some(*v),
            Sentinel::NotApplicable => None,
        }
    }
}

impl<T: Copy + Into<f64>> Serialize for Sentinel<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_model_input())
    }
}

/// The two run-rate derivations in use. They are not interchangeable: each model was fit on the
/// rows its own producer emits, and reconciling them means regenerating the table and retraining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunRateStrategy {
    /// Batch: `over_index + deliveries_in_over / 6`, using the over's full delivery count.
    OverCompletion,
    /// Live: runs divided by the cricket-notation decimal overs as typed (12.4 read as 12.4).
    DecimalOvers,
}

/// Overs completed as the batch extractor approximates them. The denominator counts every
/// delivery in the over, including ones not yet bowled at this point in the sequence.
pub fn overs_completed(over_index: u32, deliveries_in_over: usize) -> f64 {
    over_index as f64 + deliveries_in_over as f64 / BALLS_PER_OVER
}

pub fn over_completion_run_rate(runs_so_far: u32, over_index: u32, deliveries_in_over: usize) -> f64 {
    let overs = overs_completed(over_index, deliveries_in_over);
    if overs > 0.0 {
        runs_so_far as f64 / overs
    } else {
        0.0
    }
}

pub fn decimal_overs_run_rate(runs_so_far: u32, overs: f64) -> f64 {
    if overs > 0.0 {
        runs_so_far as f64 / overs
    } else {
        0.0
    }
}

impl RunRateStrategy {
    pub fn label(self) -> &'static str {
        match self {
            RunRateStrategy::OverCompletion => "over-completion",
            RunRateStrategy::DecimalOvers => "decimal-overs",
        }
    }
}
