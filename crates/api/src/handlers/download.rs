//! Download proxy for generated artifacts.
//!
//! The caller passes the service-internal locator it got from a finished
//! operation. The credential is appended on this side only, and the
//! upstream body is streamed back without being buffered.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header::{self, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use vidgen_genai::api::GenAiApiError;
use vidgen_genai::jobs::{self, JobError};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Content type used when the upstream does not send one.
const DEFAULT_CONTENT_TYPE: &str = "video/mp4";

/// Headers copied from the upstream response when present.
const FORWARDED_HEADERS: [header::HeaderName; 2] = [header::CONTENT_LENGTH, header::ACCEPT_RANGES];

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub uri: Option<String>,
}

/// GET /api/download?uri=<locator>
///
/// - 400 when `uri` is missing or not an artifact location
/// - 500 when the credential is missing or the upstream is unreachable
/// - upstream status mirrored when the upstream fails, with the canonical
///   reason phrase for that status as `error` (a custom phrase sent by the
///   upstream is not forwarded)
/// - otherwise 200 with the upstream body streamed through
pub async fn download_artifact(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> AppResult<Response> {
    let locator = params.uri.unwrap_or_default();

    let upstream = jobs::open_artifact(&state.genai, state.credential(), &locator)
        .await
        .map_err(|e| match e {
            JobError::Api(GenAiApiError::Request(err)) => {
                tracing::error!(error = %err, "Artifact download failed");
                AppError::Upstream("Failed to download video.".into())
            }
            other => other.into(),
        })?;

    let status = upstream.status();
    if !status.is_success() {
        let reason = status.canonical_reason().unwrap_or("Upstream error");
        tracing::warn!(
            upstream_status = status.as_u16(),
            reason,
            "Artifact upstream returned non-success status",
        );
        let body = json!({ "error": reason, "code": "UPSTREAM_ERROR" });
        return Ok((status, Json(body)).into_response());
    }

    let mut builder = Response::builder().status(StatusCode::OK).header(
        header::CONTENT_TYPE,
        upstream
            .headers()
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
    );
    for name in FORWARDED_HEADERS {
        if let Some(value) = upstream.headers().get(&name) {
            builder = builder.header(name, value.clone());
        }
    }

    builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| AppError::InternalError(e.to_string()))
}
