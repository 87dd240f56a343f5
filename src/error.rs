//! Error types for vwoptimize.
//!
//! Every error is fatal: the run stops and the binary prints the message.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// vwoptimize error types
#[derive(Error, Debug)]
pub enum Error {
    /// Column spec could not be parsed or violates a role invariant
    #[error("invalid column spec: {0}")]
    ColumnSpec(String),

    /// Row has a different number of fields than the column spec
    #[error("row {row}: expected {expected} columns according to column spec, found {found}")]
    ColumnCount {
        /// 1-based line number in the input file
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A field that must be numeric is not
    #[error("row {row}: {column} value '{value}' is not a number")]
    NotNumeric {
        row: usize,
        column: String,
        value: String,
    },

    /// Weights must be non-negative
    #[error("row {row}: weight must be non-negative, got {value}")]
    NegativeWeight { row: usize, value: f64 },

    /// Input file contained no data rows
    #[error("dataset is empty")]
    EmptyDataset,

    /// Metric name not recognised
    #[error("unknown metric '{0}' (expected one of: acc, acc_w, mse, mse_w)")]
    UnknownMetric(String),

    /// VW option with malformed alternatives or range
    #[error("invalid value for {option}: {reason}")]
    OptionGrammar { option: String, reason: String },

    /// Tuning needs something to compare configurations by
    #[error("searching over options requires at least one --metric")]
    NoMetric,

    /// Trainer binary could not be started
    #[error("failed to execute {program}: {source}")]
    TrainerSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Trainer ran but exited unsuccessfully
    #[error("{program} failed ({status}) with options '{options}'\n{stderr}")]
    TrainerFailed {
        program: String,
        status: String,
        options: String,
        stderr: String,
    },

    /// Predictions file does not line up with the dataset
    #[error("expected {expected} predictions, got {found}")]
    PredictionCount { expected: usize, found: usize },

    /// Prediction line could not be parsed
    #[error("cannot parse prediction on line {line}: '{text}'")]
    BadPrediction { line: usize, text: String },

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON export error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
