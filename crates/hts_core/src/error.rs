//! Error types for hts_core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur while building images and collections.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A mode set was built without any modes.
    #[error("Mode set is empty")]
    EmptyModeSet,

    /// A mode value that is not a positive integer.
    #[error("Invalid mode {0}: modes must be positive integers")]
    InvalidMode(i64),

    /// The same mode was listed twice.
    #[error("Duplicate mode {0}")]
    DuplicateMode(u32),

    /// A band lookup failed.
    #[error("Band '{0}' not found")]
    MissingBand(String),

    /// A band was added under a name already present in the image.
    #[error("Band '{0}' already exists")]
    DuplicateBand(String),

    /// Band or image pixel counts disagree.
    #[error("Pixel count mismatch: expected {expected}, got {got}")]
    PixelCountMismatch {
        /// Expected number of pixels.
        expected: usize,
        /// Actual number of pixels.
        got: usize,
    },

    /// An operation needed at least one observation.
    #[error("Image collection is empty")]
    EmptyCollection,

    /// A band name or value could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}
