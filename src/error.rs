use thiserror::Error;

/// Failure to turn one match file into feature rows. The batch driver logs these and moves on.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed match record: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Value '{value}' not recognized in '{column}' encoder.")]
    UnrecognizedCategory { column: String, value: String },

    #[error("no encoder for column '{0}'")]
    UnknownColumn(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("innings must be 1 or 2 (got {0})")]
    Innings(u8),

    #[error("target runs must be at least 1 in the second innings")]
    MissingTarget,

    #[error("overs must be between 0 and {max} (got {got})")]
    Overs { got: f64, max: u32 },

    #[error("overs take one ball digit after the point (got {0})")]
    OversPrecision(f64),

    #[error("wickets must be between 0 and 10 (got {0})")]
    Wickets(u32),
}

/// Form input that cannot be turned into a snapshot yet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("need at least two teams to pick from")]
    NoTeams,

    #[error("{field}: '{raw}' is not a valid number")]
    InvalidNumber { field: &'static str, raw: String },
}

/// Reasons a single live prediction request cannot be answered. None of these are fatal to the
/// process; the caller shows the message and waits for corrected input.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("feature '{0}' is not produced by the live row")]
    UnknownFeature(String),

    #[error("feature '{0}' has no value for this snapshot")]
    MissingFeature(String),

    #[error("model expects {expected} features, got {got}")]
    FeatureCount { expected: usize, got: usize },
}
