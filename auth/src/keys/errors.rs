use thiserror::Error;

/// Error type for key loading operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("Key file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read key file {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Key file {0} does not contain PEM material")]
    InvalidPem(String),
}
