//! Request handlers.
//!
//! Readers only ever see the tip snapshot the guard hands out. Submissions
//! are opened and verified first; a proof that fails to open never
//! reaches the guard.

use axum::{
    Form, Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use canary_chain::ChainGuard;
use canary_core::{ProtocolVersion, RawDocument, Timestamp};
use canary_proof::{PublicKey, open_proof};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;

/// Shared state for all handlers
#[derive(Debug)]
pub struct AppState {
    /// Holder of the chain tip
    pub guard: ChainGuard,
    /// The single trusted canary key
    pub key: PublicKey,
}

impl AppState {
    /// Create handler state
    #[must_use]
    pub fn new(guard: ChainGuard, key: PublicKey) -> Self {
        Self { guard, key }
    }
}

/// Canary status on this node
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Protocol version this node accepts
    pub version: ProtocolVersion,
    /// Trusted public key as hex
    pub key: String,
    /// Whether a canary has ever been accepted
    pub enabled: bool,
    /// Deadline of the latest canary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Timestamp>,
}

/// Submission form
#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    /// The proof document, verbatim; a missing field reads as empty
    #[serde(default)]
    pub proof: String,
}

fn plain_text(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

/// Serves the public key
///
/// GET /key
pub async fn get_key(State(state): State<Arc<AppState>>) -> Response {
    plain_text(state.key.to_hex())
}

/// Returns canary status on this node
///
/// GET /status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let tip = state.guard.read_tip();
    Json(StatusResponse {
        version: ProtocolVersion::CURRENT,
        key: state.key.to_hex(),
        enabled: tip.is_some(),
        deadline: tip.map(|tip| tip.deadline()),
    })
}

/// Serves the latest published canary verbatim
///
/// GET /latest
pub async fn latest(State(state): State<Arc<AppState>>) -> Response {
    match state.guard.read_tip() {
        Some(tip) => plain_text(tip.document.as_str().to_string()),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Adds a new canary
///
/// POST /submit
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SubmitForm>,
) -> Result<StatusCode, ApiError> {
    let document = RawDocument::new(form.proof);
    debug!(document = ?document, "New proof submission");

    let statement = open_proof(&state.key, &document)?;

    // Persistence blocks, and so does the guard's write lock.
    tokio::task::spawn_blocking(move || {
        state
            .guard
            .propose_extension(statement, document, Timestamp::now())
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(StatusCode::NO_CONTENT)
}
