//! Client-side error type and its mapping onto the shared classification.

use serde_json::json;
use vidgen_core::classify::{classify_service_error, ClassifiedError, ErrorKind};
use vidgen_core::error::CoreError;
use vidgen_core::operation::ServiceFailure;

/// Every way a generation run can fail on the caller side.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Local validation or configuration failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The edge server answered with a non-success status.
    #[error("Server returned {status}: {message}")]
    Server {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The edge server could not be reached or the body could not be read.
    #[error("Request failed: {0}")]
    Request(reqwest::Error),

    /// Writing an artifact to disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The job did not finish within the configured bounds.
    #[error("Generation did not finish after {attempts} status checks")]
    Timeout { attempts: u32 },

    /// The run was cancelled by the caller.
    #[error("Generation cancelled")]
    Cancelled,

    /// The job finished without producing any artifact.
    #[error("No videos were generated")]
    NoArtifacts { reasons: Vec<String> },

    /// The job finished with a service-reported failure.
    #[error("Generation failed: {}", .0.describe())]
    Operation(ServiceFailure),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Request(err.without_url())
    }
}

impl ClientError {
    /// Map onto the shared error kinds.
    pub fn classify(&self) -> ClassifiedError {
        match self {
            ClientError::Core(core) => ClassifiedError::from(core),
            ClientError::Server {
                status,
                code,
                message,
            } => classify_server_error(*status, code.as_deref(), message),
            ClientError::Request(err) => {
                ClassifiedError::new(ErrorKind::Service, format!("Failed to reach the server: {err}"))
            }
            ClientError::Io(err) => ClassifiedError::new(ErrorKind::Service, err.to_string()),
            ClientError::Timeout { .. } => ClassifiedError::new(
                ErrorKind::Timeout,
                "Video generation is taking too long. Please try again later.",
            ),
            ClientError::Cancelled => {
                ClassifiedError::new(ErrorKind::Cancelled, "Video generation was cancelled.")
            }
            ClientError::NoArtifacts { reasons } => {
                let mut message = "No videos were generated.".to_string();
                if !reasons.is_empty() {
                    message.push(' ');
                    message.push_str(&reasons.join(" "));
                }
                ClassifiedError::new(ErrorKind::NoArtifacts, message)
            }
            ClientError::Operation(failure) => {
                let raw = json!({ "error": failure }).to_string();
                let classified = classify_service_error(&raw);
                ClassifiedError::new(classified.kind, failure.describe())
            }
        }
    }

    /// Human-readable text for display.
    pub fn friendly_message(&self) -> String {
        self.classify().message
    }
}

/// Classify a `{ error, code }` body from the edge server.
fn classify_server_error(status: u16, code: Option<&str>, message: &str) -> ClassifiedError {
    if code == Some(ErrorKind::Configuration.code()) {
        return ClassifiedError::new(ErrorKind::Configuration, message);
    }
    if status == 400 || code == Some(ErrorKind::Validation.code()) {
        return ClassifiedError::new(ErrorKind::Validation, message);
    }
    let classified = classify_service_error(message);
    if code == Some(ErrorKind::QuotaExceeded.code()) {
        return ClassifiedError::new(ErrorKind::QuotaExceeded, classified.message);
    }
    classified
}
