//! Error types for beth-prep

use thiserror::Error;

/// Fatal errors surfaced out of `fit` / `transform`
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Table shape mismatch: {0}")]
    Shape(String),

    #[error("Cannot encode column '{column}' at row {row}: {reason}")]
    Encoding {
        column: String,
        row: usize,
        reason: String,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-row args parse failures.
///
/// These never escape `transform`: the affected row is dropped from the args
/// fragment and the failure is reported as a [`ParseDiagnostic`].
///
/// [`ParseDiagnostic`]: crate::types::ParseDiagnostic
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsParseError {
    #[error("Segment '{0}' has no ': ' key/value delimiter")]
    MissingDelimiter(String),

    #[error("Args cell is not text")]
    NotText,
}
