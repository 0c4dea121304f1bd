use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("historical dataset not found: {0}")]
    HistoryNotFound(PathBuf),

    #[error("Required columns missing in historical dataset")]
    HistoricalColumnsMissing(Vec<String>),

    #[error("Required columns missing in live responses")]
    LiveColumnsMissing(Vec<String>),

    #[error("invalid timestamp {value:?} at row {row}")]
    InvalidTimestamp { row: usize, value: String },

    #[error("invalid sentiment {value:?} at row {row}")]
    InvalidSentiment { row: usize, value: String },

    #[error("invalid {column} value {value:?} at row {row}")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("live responses are not configured")]
    LiveUnavailable,

    #[error("live source error: {0}")]
    Live(String),

    #[error("history header mismatch: expected {expected:?}, found {found:?}")]
    HeaderMismatch { expected: String, found: String },

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Errors caused by the shape or content of the data rather than by the
    /// system reading it. These are reported to clients as ordinary results.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::HistoricalColumnsMissing(_)
                | Self::LiveColumnsMissing(_)
                | Self::InvalidTimestamp { .. }
                | Self::InvalidSentiment { .. }
                | Self::InvalidNumber { .. }
        )
    }
}
