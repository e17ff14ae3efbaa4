//! HTTP client for the edge server.
//!
//! The edge server holds the credential; everything here talks to it over
//! plain JSON. Artifacts that already carry their own signature are fetched
//! from their locator directly.

use serde::Deserialize;
use serde_json::json;
use vidgen_core::generation::{GenerateBody, GenerationRequest};
use vidgen_core::operation::{ArtifactReference, OperationEnvelope, OperationHandle};

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Fallback message when a submit fails without a readable body.
pub const GENERATE_FAILED: &str = "Failed to start video generation.";

/// Fallback message when a status check fails without a readable body.
pub const STATUS_FAILED: &str = "Failed to check video generation status.";

/// Fallback message when a download fails without a readable body.
pub const DOWNLOAD_FAILED: &str = "Could not download the generated video.";

/// `{ error, code }` body returned by the edge server on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Edge server client.
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Build with a caller-supplied `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            client,
            base_url: config.server_url.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a generation request and return the issued handle.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<OperationHandle, ClientError> {
        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&GenerateBody::from(request))
            .send()
            .await?;
        let response = ensure_success(response, GENERATE_FAILED).await?;
        let envelope: OperationEnvelope = response.json().await?;

        tracing::info!(operation = envelope.operation.name(), "Generation submitted");
        Ok(envelope.operation)
    }

    /// Refresh a handle. The returned handle replaces the one passed in.
    pub async fn status(&self, handle: &OperationHandle) -> Result<OperationHandle, ClientError> {
        let url = format!("{}/api/status", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "operation": handle }))
            .send()
            .await?;
        let response = ensure_success(response, STATUS_FAILED).await?;
        let envelope: OperationEnvelope = response.json().await?;
        Ok(envelope.operation)
    }

    /// Open an artifact for streaming.
    ///
    /// Locators that need the server credential go through the download
    /// proxy; presigned ones are fetched as-is.
    pub async fn download(&self, artifact: &ArtifactReference) -> Result<reqwest::Response, ClientError> {
        let request = if artifact.requires_credential {
            let url = format!("{}/api/download", self.base_url);
            self.client.get(&url).query(&[("uri", artifact.locator.as_str())])
        } else {
            self.client.get(&artifact.locator)
        };
        let response = request.send().await?;
        ensure_success(response, DOWNLOAD_FAILED).await
    }
}

/// Turn a non-success response into [`ClientError::Server`].
async fn ensure_success(
    response: reqwest::Response,
    fallback: &str,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ErrorBody>(&text).ok();
    let code = body.as_ref().and_then(|b| b.code.clone());
    let message = body
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());

    tracing::warn!(status = status.as_u16(), code = ?code, "Edge server returned an error");
    Err(ClientError::Server {
        status: status.as_u16(),
        code,
        message,
    })
}
