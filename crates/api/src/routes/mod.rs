pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{self, download, generation};
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /generate          start a generation job (POST)
/// /status            refresh an operation handle (POST)
/// /download?uri=...  stream an artifact through the credential proxy (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/generate",
            post(generation::generate).fallback(handlers::method_not_allowed),
        )
        .route(
            "/status",
            post(generation::status).fallback(handlers::method_not_allowed),
        )
        .route(
            "/download",
            get(download::download_artifact).fallback(handlers::method_not_allowed),
        )
}
