//! Trusted-side job operations.
//!
//! These run inside the credential boundary. Each one performs its local
//! checks (input validation, then credential presence) before touching the
//! network, so a bad request or a misconfigured server never produces an
//! outbound call.

use vidgen_core::classify::{classify_service_error, ClassifiedError, ErrorKind};
use vidgen_core::credential::{missing_credential, ServerCredential};
use vidgen_core::error::CoreError;
use vidgen_core::generation::GenerationRequest;
use vidgen_core::operation::OperationHandle;

use crate::api::{GenAiApi, GenAiApiError};
use crate::wire;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] GenAiApiError),
}

impl JobError {
    /// Classify this error for the caller.
    pub fn classify(&self) -> ClassifiedError {
        match self {
            JobError::Core(core) => ClassifiedError::from(core),
            JobError::Api(GenAiApiError::ApiError { body, .. }) => classify_service_error(body),
            JobError::Api(other) => ClassifiedError::new(ErrorKind::Service, other.to_string()),
        }
    }
}

fn require(credential: Option<&ServerCredential>) -> Result<&ServerCredential, JobError> {
    credential.ok_or_else(|| JobError::Core(missing_credential()))
}

/// Submit a generation job. Not idempotent: every call creates a new job.
pub async fn submit_job(
    api: &GenAiApi,
    credential: Option<&ServerCredential>,
    request: &GenerationRequest,
) -> Result<OperationHandle, JobError> {
    request.validate()?;
    let credential = require(credential)?;

    tracing::info!(
        model = %api.config().model,
        prompt_chars = request.prompt.chars().count(),
        has_image = request.reference_image.is_some(),
        "Submitting generation job",
    );

    let handle = api
        .submit_generation(credential, request)
        .await
        .map_err(|e| e.redacted(credential))?;

    tracing::info!(operation = %handle.name(), done = handle.is_done(), "Generation job submitted");
    Ok(handle)
}

/// Run one status query for `handle` and return the updated handle.
///
/// A handle that is already done is returned unchanged without a query.
pub async fn refresh_job(
    api: &GenAiApi,
    credential: Option<&ServerCredential>,
    handle: &OperationHandle,
) -> Result<OperationHandle, JobError> {
    if !wire::is_valid_operation_name(handle.name()) {
        return Err(CoreError::Validation("Operation name is missing or invalid".into()).into());
    }
    let credential = require(credential)?;

    if handle.is_done() {
        tracing::debug!(operation = %handle.name(), "Operation already done, skipping status query");
        return Ok(handle.clone());
    }

    let updated = api
        .get_operation(credential, handle.name())
        .await
        .map_err(|e| e.redacted(credential))?;

    tracing::debug!(operation = %updated.name(), done = updated.is_done(), "Operation status refreshed");
    Ok(updated)
}

/// Open the upstream artifact behind `locator`, with the credential attached.
///
/// The authorized URL is built and used here only. The returned response
/// has not been read and may carry a non-success status.
pub async fn open_artifact(
    api: &GenAiApi,
    credential: Option<&ServerCredential>,
    locator: &str,
) -> Result<reqwest::Response, JobError> {
    if locator.trim().is_empty() {
        return Err(CoreError::Validation("Video URI is required".into()).into());
    }
    let credential = require(credential)?;

    if !api.config().allows_artifact_locator(locator) {
        return Err(CoreError::Validation("Video URI is not a recognised artifact location".into()).into());
    }
    let url = credential.authorize_locator(locator)?;

    tracing::info!(locator = %strip_query(locator), "Fetching artifact");

    let response = api
        .fetch_artifact(url)
        .await
        .map_err(|e| e.redacted(credential))?;

    tracing::info!(
        locator = %strip_query(locator),
        status = response.status().as_u16(),
        "Artifact upstream responded",
    );
    Ok(response)
}

/// Locator without its query string, for logging.
fn strip_query(locator: &str) -> &str {
    locator.split_once('?').map_or(locator, |(head, _)| head)
}
