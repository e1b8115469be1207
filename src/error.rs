//! Errors raised at the record-source boundary.
//!
//! The engine itself never fails on record content: unreadable periods and
//! missing optional fields are classifications, not errors. What does fail
//! is a collection that isn't shaped like a table of recommendations.

use std::path::PathBuf;
use thiserror::Error;

pub type SourceResult<T> = std::result::Result<T, SourceError>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported record file (expected .json or .csv): {0}")]
    UnsupportedFormat(PathBuf),

    #[error("malformed record collection: {0}")]
    MalformedCollection(String),

    #[error("row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl SourceError {
    pub(crate) fn row(row: usize, reason: impl Into<String>) -> Self {
        SourceError::MalformedRow {
            row,
            reason: reason.into(),
        }
    }
}
