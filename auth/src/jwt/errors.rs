use thiserror::Error;

/// Error type for JWT operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Key material is not a usable RSA key: {0}")]
    InvalidKey(String),

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is expired")]
    TokenExpired,

    #[error("Token was signed with an unexpected algorithm")]
    AlgorithmMismatch,

    #[error("Token is invalid: {0}")]
    InvalidToken(String),
}
