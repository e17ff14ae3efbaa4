//! REST API client for the generation service's HTTP endpoints.
//!
//! Wraps job submission, operation lookup, and artifact download using
//! [`reqwest`]. Every method takes the credential explicitly; the client
//! itself holds no secret.

use url::Url;
use vidgen_core::credential::ServerCredential;
use vidgen_core::generation::GenerationRequest;
use vidgen_core::operation::OperationHandle;

use crate::config::GenAiConfig;
use crate::wire;

/// Header carrying the credential on JSON API calls.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP client for the generation service.
pub struct GenAiApi {
    client: reqwest::Client,
    config: GenAiConfig,
}

/// Errors from the generation service REST layer.
#[derive(Debug, thiserror::Error)]
pub enum GenAiApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Generation service error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body, usually a JSON-encoded service error.
        body: String,
    },

    /// A 2xx response whose body was not the expected shape.
    #[error("Unexpected response from generation service: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for GenAiApiError {
    /// Request URLs may carry the credential, so they are dropped here.
    fn from(err: reqwest::Error) -> Self {
        GenAiApiError::Request(err.without_url())
    }
}

impl GenAiApiError {
    /// Scrub the credential from any text this error carries.
    pub fn redacted(self, credential: &ServerCredential) -> Self {
        match self {
            GenAiApiError::ApiError { status, body } => GenAiApiError::ApiError {
                status,
                body: credential.redact(&body),
            },
            GenAiApiError::InvalidResponse(msg) => {
                GenAiApiError::InvalidResponse(credential.redact(&msg))
            }
            other => other,
        }
    }
}

impl GenAiApi {
    pub fn new(config: GenAiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: GenAiConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &GenAiConfig {
        &self.config
    }

    /// Start a generation job.
    ///
    /// Sends `POST {base}/models/{model}:predictLongRunning` and returns
    /// the operation the service created.
    pub async fn submit_generation(
        &self,
        credential: &ServerCredential,
        request: &GenerationRequest,
    ) -> Result<OperationHandle, GenAiApiError> {
        let url = format!(
            "{}/models/{}:predictLongRunning",
            self.config.base_url, self.config.model
        );

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, credential.expose())
            .json(&wire::predict_body(request))
            .send()
            .await?;

        Self::parse_operation(response).await
    }

    /// Look up the current state of an operation.
    ///
    /// Sends `GET {base}/{name}`. The caller must have checked the name
    /// with [`wire::is_valid_operation_name`].
    pub async fn get_operation(
        &self,
        credential: &ServerCredential,
        name: &str,
    ) -> Result<OperationHandle, GenAiApiError> {
        let response = self
            .client
            .get(format!("{}/{}", self.config.base_url, name))
            .header(API_KEY_HEADER, credential.expose())
            .send()
            .await?;

        Self::parse_operation(response).await
    }

    /// Issue the GET for an already-authorized artifact URL.
    ///
    /// The response is returned whatever its status so the caller can
    /// mirror it; the body is not read.
    pub async fn fetch_artifact(&self, url: Url) -> Result<reqwest::Response, GenAiApiError> {
        Ok(self.client.get(url).send().await?)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`GenAiApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GenAiApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GenAiApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful response body as an operation.
    async fn parse_operation(
        response: reqwest::Response,
    ) -> Result<OperationHandle, GenAiApiError> {
        let response = Self::ensure_success(response).await?;
        let raw: serde_json::Value = response.json().await?;
        wire::normalize_operation(raw)
            .ok_or_else(|| GenAiApiError::InvalidResponse("operation has no name".into()))
    }
}
