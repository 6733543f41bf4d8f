//! Error handling for the fusion evaluator.

use thiserror::Error;

/// Main error type for the fusion evaluator
#[derive(Debug, Error)]
pub enum Error {
    /// Key absent from one of the prediction stores
    #[error("Record not found: key {key} missing from {store} store")]
    NotFound { store: String, key: String },

    /// Malformed or unparseable prediction record
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// The two decoded score arrays cannot be combined elementwise
    #[error("Shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    /// No scores to select a label from
    #[error("Cannot predict a label from an empty score array")]
    EmptyScores,

    /// Key-value store errors (open / read failures of the backing engine)
    #[error("Store error: {0}")]
    StoreError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    /// Invalid argument errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for the fusion evaluator
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Errors that belong to a single sample rather than to the whole run.
    /// Only these may be skipped under [`crate::evaluate::ErrorPolicy::Skip`].
    pub fn is_per_sample(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::DecodeError(_) | Error::ShapeMismatch { .. } | Error::EmptyScores
        )
    }
}

impl From<prost::DecodeError> for Error {
    fn from(err: prost::DecodeError) -> Self {
        Error::DecodeError(format!("datum: {}", err))
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::DecodeError(format!("bincode: {}", err))
    }
}
