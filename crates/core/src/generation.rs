//! Generation request shape and pre-submission validation.
//!
//! A [`GenerationRequest`] is built by the caller, validated locally, and
//! carried to the edge server as a [`GenerateBody`]. The server validates it
//! again before any outbound call is made.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Number of artifacts requested per job. The service supports more, but
/// every job issued here asks for exactly one.
pub const DEFAULT_ARTIFACT_COUNT: u32 = 1;

/// MIME type assumed for a reference image when the caller does not state one.
pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/png";

// ---------------------------------------------------------------------------
// Reference image
// ---------------------------------------------------------------------------

/// Optional still image that seeds the generation.
///
/// Carried as base64 text end to end; the raw bytes are only ever decoded
/// for validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImage {
    pub bytes_base64: String,
    pub mime_type: String,
}

impl ReferenceImage {
    /// Encode raw image bytes.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            bytes_base64: STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    /// Decode the payload and return its size in bytes.
    pub fn decoded_len(&self) -> Result<usize, CoreError> {
        STANDARD
            .decode(self.bytes_base64.trim())
            .map(|bytes| bytes.len())
            .map_err(|e| CoreError::Validation(format!("Reference image is not valid base64: {e}")))
    }
}

/// Guess an image MIME type from a file extension.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => DEFAULT_IMAGE_MIME_TYPE,
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A single user-initiated generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub reference_image: Option<ReferenceImage>,
    pub artifact_count: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            reference_image: None,
            artifact_count: DEFAULT_ARTIFACT_COUNT,
        }
    }

    pub fn with_reference_image(mut self, image: ReferenceImage) -> Self {
        self.reference_image = Some(image);
        self
    }

    /// Check the request before anything is sent.
    ///
    /// - the prompt must contain at least one non-whitespace character
    /// - a reference image, when present, must decode to a non-empty payload
    /// - the artifact count must be positive
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.prompt.trim().is_empty() {
            return Err(CoreError::Validation("Prompt is required".into()));
        }
        if self.artifact_count == 0 {
            return Err(CoreError::Validation(
                "Artifact count must be at least 1".into(),
            ));
        }
        if let Some(image) = &self.reference_image {
            if image.decoded_len()? == 0 {
                return Err(CoreError::Validation("Reference image is empty".into()));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wire body
// ---------------------------------------------------------------------------

/// JSON body of `POST /api/generate`.
///
/// Every field is optional on the wire so that a missing prompt is reported
/// as a validation failure rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub image_bytes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl GenerateBody {
    /// Convert into a domain request. An empty `imageBytes` string counts as
    /// no image.
    pub fn into_request(self) -> GenerationRequest {
        let mime_type = self
            .mime_type
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_MIME_TYPE.to_string());
        let reference_image = self
            .image_bytes
            .filter(|b| !b.is_empty())
            .map(|bytes_base64| ReferenceImage {
                bytes_base64,
                mime_type,
            });
        GenerationRequest {
            prompt: self.prompt,
            reference_image,
            artifact_count: DEFAULT_ARTIFACT_COUNT,
        }
    }
}

impl From<&GenerationRequest> for GenerateBody {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            prompt: request.prompt.clone(),
            image_bytes: request
                .reference_image
                .as_ref()
                .map(|i| i.bytes_base64.clone()),
            mime_type: request.reference_image.as_ref().map(|i| i.mime_type.clone()),
        }
    }
}
