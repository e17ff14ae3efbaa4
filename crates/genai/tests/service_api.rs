//! Tests for `GenAiApi` and the job operations against an in-process stub
//! of the generation service.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use vidgen_core::classify::ErrorKind;
use vidgen_core::credential::ServerCredential;
use vidgen_core::generation::GenerationRequest;
use vidgen_core::operation::OperationHandle;
use vidgen_genai::api::{GenAiApi, GenAiApiError};
use vidgen_genai::config::GenAiConfig;
use vidgen_genai::jobs::{self, JobError};

const SECRET: &str = "test-secret-key";

#[derive(Clone, Default)]
struct Recorded {
    api_keys: Arc<Mutex<Vec<String>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
    download_queries: Arc<Mutex<Vec<String>>>,
}

async fn predict(State(rec): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    rec.api_keys.lock().unwrap().push(key);
    rec.bodies.lock().unwrap().push(body);
    Json(json!({ "name": "models/veo/operations/op1" }))
}

async fn operation(State(rec): State<Recorded>, headers: HeaderMap) -> Json<Value> {
    let key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    rec.api_keys.lock().unwrap().push(key);
    Json(json!({
        "name": "models/veo/operations/op1",
        "done": true,
        "response": {
            "generateVideoResponse": {
                "generatedSamples": [ { "video": { "uri": "http://127.0.0.1/v1beta/files/f1:download?alt=media" } } ]
            }
        }
    }))
}

async fn quota_exhausted() -> (StatusCode, Json<Value>) {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "error": { "code": 429, "message": "Quota exceeded for key test-secret-key", "status": "RESOURCE_EXHAUSTED" } })),
    )
}

async fn download(
    State(rec): State<Recorded>,
    Query(params): Query<Vec<(String, String)>>,
) -> (StatusCode, &'static str) {
    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    rec.download_queries.lock().unwrap().push(query);
    (StatusCode::OK, "video-bytes")
}

async fn spawn_stub(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

async fn stub_api() -> (GenAiApi, Recorded) {
    let rec = Recorded::default();
    let router = Router::new()
        .route("/v1beta/models/{action}", post(predict))
        .route("/v1beta/models/veo/operations/{id}", get(operation))
        .route("/v1beta/files/{file}", get(download))
        .with_state(rec.clone());
    let addr = spawn_stub(router).await;
    let config = GenAiConfig::new(format!("http://{addr}/v1beta"), "veo");
    (GenAiApi::new(config), rec)
}

fn credential() -> ServerCredential {
    ServerCredential::new(SECRET).unwrap()
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_sends_prompt_and_single_artifact_directive() {
    let (api, rec) = stub_api().await;
    let cred = credential();

    let handle = jobs::submit_job(&api, Some(&cred), &GenerationRequest::new("a lighthouse"))
        .await
        .unwrap();

    assert_eq!(handle.name(), "models/veo/operations/op1");
    assert!(!handle.is_done());

    let bodies = rec.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["instances"][0]["prompt"], "a lighthouse");
    assert_eq!(bodies[0]["parameters"]["sampleCount"], 1);
    assert_eq!(rec.api_keys.lock().unwrap().as_slice(), [SECRET.to_string()]);
}

#[tokio::test]
async fn blank_prompt_makes_no_call() {
    let (api, rec) = stub_api().await;
    let cred = credential();

    let err = jobs::submit_job(&api, Some(&cred), &GenerationRequest::new("   "))
        .await
        .unwrap_err();

    assert_eq!(err.classify().kind, ErrorKind::Validation);
    assert!(rec.bodies.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_normalizes_finished_operation() {
    let (api, rec) = stub_api().await;
    let cred = credential();

    let updated = jobs::refresh_job(&api, Some(&cred), &OperationHandle::pending("models/veo/operations/op1"))
        .await
        .unwrap();

    assert!(updated.is_done());
    let artifacts = updated.artifacts().unwrap();
    assert_eq!(artifacts.len(), 1);
    assert!(artifacts[0].requires_credential);
    assert_eq!(rec.api_keys.lock().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn quota_error_is_redacted_and_classified() {
    let router = Router::new().route("/v1beta/models/{action}", post(quota_exhausted));
    let addr = spawn_stub(router).await;
    let api = GenAiApi::new(GenAiConfig::new(format!("http://{addr}/v1beta"), "veo"));
    let cred = credential();

    let err = jobs::submit_job(&api, Some(&cred), &GenerationRequest::new("x"))
        .await
        .unwrap_err();

    assert_matches!(&err, JobError::Api(GenAiApiError::ApiError { status: 429, .. }));
    assert!(!err.to_string().contains(SECRET));

    let classified = err.classify();
    assert_eq!(classified.kind, ErrorKind::QuotaExceeded);
    assert!(!classified.message.contains(SECRET));
}

#[tokio::test]
async fn transport_error_does_not_leak_credential() {
    // Nothing listens on port 1.
    let api = GenAiApi::new(GenAiConfig::new("http://127.0.0.1:1/v1beta", "veo"));
    let cred = credential();

    let err = jobs::open_artifact(&api, Some(&cred), "http://127.0.0.1:1/v1beta/files/f:download?alt=media")
        .await
        .unwrap_err();

    assert_matches!(err, JobError::Api(GenAiApiError::Request(_)));
    assert!(!format!("{err}").contains(SECRET));
    assert!(!format!("{err:?}").contains(SECRET));
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn open_artifact_appends_credential_upstream() {
    let (api, rec) = stub_api().await;
    let cred = credential();
    let locator = format!("{}/files/f1:download?alt=media", api.config().base_url);

    let response = jobs::open_artifact(&api, Some(&cred), &locator).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "video-bytes");
    assert_eq!(
        rec.download_queries.lock().unwrap().as_slice(),
        [format!("alt=media&key={SECRET}")]
    );
}
