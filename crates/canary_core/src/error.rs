//! Core error types for canary chains.

use crate::hash::HashError;
use crate::version::VersionError;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Invalid encoding
    #[error("Invalid encoding: {message}")]
    InvalidEncoding { message: String },

    /// Invalid hash format
    #[error("Invalid hash: {0}")]
    InvalidHash(#[from] HashError),

    /// Invalid timestamp
    #[error("Invalid timestamp: {reason}")]
    InvalidTimestamp { reason: String },

    /// Invalid version
    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] VersionError),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidEncoding {
            message: err.to_string(),
        }
    }
}
