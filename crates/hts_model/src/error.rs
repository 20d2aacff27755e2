//! Error types for hts_model.

use hts_core::CoreError;
use thiserror::Error;

/// Result type alias using [`ModelError`].
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while building or fitting a harmonic model.
///
/// All of these are programmer or configuration errors; none is retried.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A step ran before the band or result it reads was produced.
    #[error("'{step}' requires {requires}, which has not been computed yet")]
    MissingDependency {
        /// The step that was called.
        step: &'static str,
        /// What it needed.
        requires: String,
    },

    /// A regression term was registered twice.
    #[error("Term '{0}' was already added")]
    DuplicateTerm(String),

    /// The design changed after coefficients were broadcast.
    #[error("'{0}' cannot run after coefficients have been computed")]
    AlreadyFitted(&'static str),

    /// Fewer observations than independent variables.
    #[error("Under-determined fit: {observations} observations for {terms} independent variables")]
    UnderDetermined {
        /// Number of observations in the collection.
        observations: usize,
        /// Number of independent variables.
        terms: usize,
    },

    /// The dependent variable is missing from the collection.
    #[error("Dependent variable '{0}' is not present in every observation")]
    UnknownDependent(String),

    /// A mode outside the configured mode set.
    #[error("Mode {0} is not part of the configured mode set")]
    UnknownMode(u32),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Configuration (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
