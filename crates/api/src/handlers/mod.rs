pub mod download;
pub mod generation;

use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

/// Fallback for known paths hit with the wrong method.
pub async fn method_not_allowed() -> (StatusCode, Json<Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed", "code": "METHOD_NOT_ALLOWED" })),
    )
}
