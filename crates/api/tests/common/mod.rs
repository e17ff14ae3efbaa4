#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{self, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use vidgen_api::config::ServerConfig;
use vidgen_api::router::build_app_router;
use vidgen_api::state::AppState;
use vidgen_core::credential::ServerCredential;
use vidgen_genai::config::GenAiConfig;

pub const SECRET: &str = "stub-secret-credential";

/// Size of the stub artifact body, large enough to span several chunks.
pub const ARTIFACT_LEN: usize = 256 * 1024;

// ---------------------------------------------------------------------------
// Stub generation service
// ---------------------------------------------------------------------------

/// Call counters for the stub generation service.
#[derive(Clone, Default)]
pub struct StubCalls {
    pub submits: Arc<AtomicUsize>,
    pub polls: Arc<AtomicUsize>,
    pub downloads: Arc<AtomicUsize>,
}

impl StubCalls {
    pub fn total(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
            + self.polls.load(Ordering::SeqCst)
            + self.downloads.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct StubState {
    base_url: String,
    calls: StubCalls,
}

pub struct StubService {
    pub base_url: String,
    pub calls: StubCalls,
}

impl StubService {
    /// Locator of an artifact the stub serves.
    pub fn locator(&self, file: &str) -> String {
        format!("{}/files/{file}:download?alt=media", self.base_url)
    }
}

fn has_key(headers: &axum::http::HeaderMap) -> bool {
    headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        == Some(SECRET)
}

async fn stub_predict(
    State(stub): State<StubState>,
    headers: axum::http::HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    stub.calls.submits.fetch_add(1, Ordering::SeqCst);
    if !has_key(&headers) {
        return (StatusCode::FORBIDDEN, Json(json!({ "error": { "code": 403, "message": "bad key" } })))
            .into_response();
    }
    let prompt = body["instances"][0]["prompt"].as_str().unwrap_or_default();
    if prompt.contains("exhaust") {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": {
                "code": 429,
                "message": "You exceeded your current quota.",
                "status": "RESOURCE_EXHAUSTED",
            } })),
        )
            .into_response();
    }
    Json(json!({ "name": "models/veo/operations/op1" })).into_response()
}

async fn stub_operation(
    State(stub): State<StubState>,
    Path(id): Path<String>,
) -> Json<Value> {
    stub.calls.polls.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "name": format!("models/veo/operations/{id}"),
        "done": true,
        "response": {
            "generateVideoResponse": {
                "generatedSamples": [
                    { "video": { "uri": format!("{}/files/video1:download?alt=media", stub.base_url) } }
                ]
            }
        }
    }))
}

async fn stub_download(
    State(stub): State<StubState>,
    Path(file): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response<Body> {
    stub.calls.downloads.fetch_add(1, Ordering::SeqCst);
    let key_ok = params.iter().any(|(k, v)| k == "key" && v == SECRET);
    if !key_ok {
        return StatusCode::FORBIDDEN.into_response();
    }
    match file.as_str() {
        "video1:download" => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "video/webm")
            .header(header::CONTENT_LENGTH, ARTIFACT_LEN.to_string())
            .header(header::ACCEPT_RANGES, "bytes")
            .body(Body::from(artifact_bytes()))
            .unwrap(),
        "bare:download" => Response::builder()
            .status(StatusCode::OK)
            .body(Body::from("bare"))
            .unwrap(),
        "flaky:download" => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Deterministic artifact payload.
pub fn artifact_bytes() -> Vec<u8> {
    (0..ARTIFACT_LEN).map(|i| (i % 251) as u8).collect()
}

/// Start the stub generation service on an ephemeral port.
pub async fn spawn_stub_service() -> StubService {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let base_url = format!("http://{addr}/v1beta");
    let calls = StubCalls::default();

    let router = Router::new()
        .route("/v1beta/models/{action}", post(stub_predict))
        .route("/v1beta/models/veo/operations/{id}", routing::get(stub_operation))
        .route("/v1beta/files/{file}", routing::get(stub_download))
        .with_state(StubState {
            base_url: base_url.clone(),
            calls: calls.clone(),
        });

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    StubService { base_url, calls }
}

// ---------------------------------------------------------------------------
// App under test
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` pointing at `genai_base_url`.
pub fn test_config(genai_base_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        genai: GenAiConfig::new(genai_base_url, "veo"),
    }
}

/// Build the full application router against the stub, with or without
/// the server credential.
pub fn build_test_app(stub: &StubService, with_credential: bool) -> Router {
    let credential = if with_credential {
        ServerCredential::new(SECRET)
    } else {
        None
    };
    let state = AppState::new(test_config(&stub.base_url), credential);
    build_app_router(state)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

/// `/api/download` path with `locator` as the encoded `uri` parameter.
pub fn download_path(locator: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("uri", locator)
        .finish();
    format!("/api/download?{query}")
}
