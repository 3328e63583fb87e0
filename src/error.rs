//! Error types for encoding, schema validation and inference dispatch.

use thiserror::Error;

use crate::schema::CategoryFamily;

/// Disagreement between a column list and the canonical feature schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("expected {expected} feature columns, found {found}")]
    WidthMismatch { expected: usize, found: usize },
    #[error("column {position} should be {expected:?}, found {found:?}")]
    ColumnMismatch {
        position: usize,
        expected: String,
        found: String,
    },
    #[error("feature schema version {found:?} does not match {expected:?}")]
    VersionMismatch { expected: String, found: String },
}

/// Failure while turning a raw transaction into a feature vector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("{family} {value:?} is not a known category")]
    UnknownCategory {
        family: CategoryFamily,
        value: String,
    },
}

/// The classifier could not produce labels for a feature matrix.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("feature matrix rejected: {0}")]
    Schema(#[from] SchemaError),
    #[error("row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("classifier returned {found} labels for {expected} rows")]
    LabelCount { expected: usize, found: usize },
    #[error("classifier runtime failed: {0}")]
    Runtime(String),
}

/// Failure of a single or batch fraud check.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("classifier returned label {0}, expected 0 or 1")]
    UnexpectedLabel(i64),
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Failure reading a batch table.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("row {row}, column {column:?}: {value:?} is not a number")]
    NotNumeric {
        row: usize,
        column: String,
        value: String,
    },
    #[error("batch table has no header row")]
    MissingHeader,
}

impl CheckError {
    /// Short label for counters and logs
    pub fn kind(&self) -> &'static str {
        match self {
            CheckError::Encode(EncodeError::UnknownCategory { .. }) => "unknown_category",
            CheckError::Inference(InferenceError::Runtime(_)) => "runtime",
            CheckError::Inference(_) => "shape_mismatch",
            CheckError::UnexpectedLabel(_) => "unexpected_label",
            CheckError::InvalidField { .. } => "invalid_field",
        }
    }
}
