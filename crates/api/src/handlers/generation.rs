//! Handlers for job submission and status refresh.
//!
//! Both endpoints are stateless: the caller holds the operation handle and
//! sends it back on every status query.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use vidgen_core::error::CoreError;
use vidgen_core::generation::GenerateBody;
use vidgen_core::operation::{OperationEnvelope, OperationHandle};
use vidgen_genai::jobs;

use crate::error::AppResult;
use crate::state::AppState;

/// Body of `POST /api/status`. The handle is optional on the wire so a
/// missing one is reported as a validation failure.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub operation: Option<OperationHandle>,
}

/// POST /api/generate
///
/// Validates the prompt, checks the credential, then starts exactly one
/// generation job. Returns `{ operation }`.
pub async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> AppResult<Json<OperationEnvelope>> {
    let request = body.into_request();
    let operation = jobs::submit_job(&state.genai, state.credential(), &request).await?;
    Ok(Json(OperationEnvelope { operation }))
}

/// POST /api/status
///
/// Runs one status query for the given handle and returns the updated
/// handle as `{ operation }`.
pub async fn status(
    State(state): State<AppState>,
    Json(body): Json<StatusRequest>,
) -> AppResult<Json<OperationEnvelope>> {
    let handle = body
        .operation
        .ok_or_else(|| CoreError::Validation("Operation is required".into()))?;
    let operation = jobs::refresh_job(&state.genai, state.credential(), &handle).await?;
    Ok(Json(OperationEnvelope { operation }))
}
