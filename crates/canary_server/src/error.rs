//! API error types and responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use canary_chain::ExtensionError;
use canary_proof::ProofError;
use serde::Serialize;
use thiserror::Error;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    /// Submission is not a valid proof under the trusted key
    #[error("{0}")]
    InvalidProof(#[from] ProofError),

    /// Proof was valid but could not extend the chain
    #[error("{0}")]
    Extension(#[from] ExtensionError),

    /// Unexpected server fault
    #[error("Internal error: {0}")]
    Internal(String),
}

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable reason
    pub error: String,
    /// Stable machine-readable code
    pub code: &'static str,
}

impl ApiError {
    /// Stable machine-readable code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidProof(_) => "invalid_proof",
            Self::Extension(err) => err.code(),
            Self::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidProof(_) => StatusCode::BAD_REQUEST,
            Self::Extension(ExtensionError::Rejected(_)) => StatusCode::BAD_REQUEST,
            Self::Extension(ExtensionError::PersistFailed(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Server faults keep their details in the log
        let error = if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorResponse {
            error,
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}
