use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use vidgen_core::classify::{classify_service_error, ErrorKind};
use vidgen_core::error::CoreError;
use vidgen_genai::api::GenAiApiError;
use vidgen_genai::jobs::JobError;

/// Message shown when the server-held credential is missing.
pub const MISCONFIGURED_MESSAGE: &str = "Server configuration error: API key not set.";

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce consistent `{ "error", "code" }`
/// JSON bodies. Nothing in here ever carries the server credential: service
/// error bodies are redacted before they reach this type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `vidgen_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failure from a job operation against the generation service.
    #[error(transparent)]
    Job(#[from] JobError),

    /// The generation service could not be reached; the message is ours
    /// and safe to show.
    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Job(JobError::Core(core)) => classify_core_error(core),
            AppError::Job(JobError::Api(api)) => classify_api_error(api),

            AppError::Upstream(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::Service.code(),
                msg.clone(),
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a domain error to an HTTP status, error code, and message.
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            ErrorKind::Validation.code(),
            msg.clone(),
        ),
        CoreError::Configuration(msg) => {
            tracing::error!(error = %msg, "Server credential is not configured");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::Configuration.code(),
                MISCONFIGURED_MESSAGE.to_string(),
            )
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Map a generation service failure to an HTTP status, error code, and
/// message.
///
/// - Service-reported errors keep their (redacted) body as the message so
///   callers can run their own classification; the code carries ours.
/// - Transport failures get a fixed message.
fn classify_api_error(err: &GenAiApiError) -> (StatusCode, &'static str, String) {
    match err {
        GenAiApiError::ApiError { status, body } => {
            let classified = classify_service_error(body);
            tracing::warn!(
                upstream_status = status,
                kind = %classified.kind,
                "Generation service rejected request",
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                classified.kind.code(),
                body.clone(),
            )
        }
        GenAiApiError::Request(e) => {
            tracing::error!(error = %e, "Generation service unreachable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::Service.code(),
                "Failed to reach the generation service.".to_string(),
            )
        }
        GenAiApiError::InvalidResponse(msg) => {
            tracing::error!(error = %msg, "Unexpected generation service response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::Service.code(),
                msg.clone(),
            )
        }
    }
}
