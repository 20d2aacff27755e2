//! Error types for hts_data.

use thiserror::Error;

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while reading, writing or generating collections.
#[derive(Error, Debug)]
pub enum DataError {
    /// File format error.
    #[error("File format error: {0}")]
    FormatError(String),

    /// A cell could not be parsed.
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number in the input.
        line: u64,
        /// What went wrong.
        message: String,
    },

    /// Invalid generator or loader input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV reader or writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core error.
    #[error("Core error: {0}")]
    CoreError(#[from] hts_core::CoreError),
}
