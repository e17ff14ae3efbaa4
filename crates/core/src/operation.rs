//! Operation handles, derived status, and artifact references.
//!
//! An [`OperationHandle`] is the envelope the generation service returns for
//! a long-running job. It is passed back verbatim on every status query and
//! replaced by whatever the service answers, so progress data and results
//! ride inside it. [`OperationStatus`] is derived from a handle on demand and
//! never stored.

use serde::{Deserialize, Serialize};
use url::Url;

/// Query parameters that mark a locator as already pre-signed.
const PRESIGNED_QUERY_KEYS: &[&str] = &["X-Goog-Signature", "X-Amz-Signature", "sig", "signature"];

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Opaque, service-issued job envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationHandle {
    /// Service-side resource name, e.g. `models/x/operations/abc123`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    /// Progress data, preserved exactly as the service sent it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<OperationResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ServiceFailure>,
}

/// Result payload of a finished operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    /// `None` when the service omitted the list entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_videos: Option<Vec<GeneratedVideo>>,
    /// Reasons the service gave for withholding output, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered_reasons: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedVideo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Structured error attached to an operation or returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl OperationHandle {
    /// A freshly submitted, not-yet-finished handle.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Artifacts listed in the handle, in service order.
    ///
    /// Returns `None` when the result list is absent. Entries without a
    /// locator are skipped but keep their ordinal position for naming.
    pub fn artifacts(&self) -> Option<Vec<ArtifactReference>> {
        let videos = self.response.as_ref()?.generated_videos.as_ref()?;
        Some(
            videos
                .iter()
                .enumerate()
                .filter_map(|(index, v)| {
                    let uri = v.video.as_ref()?.uri.as_deref()?;
                    if uri.is_empty() {
                        return None;
                    }
                    Some(ArtifactReference::new(index, uri))
                })
                .collect(),
        )
    }

    /// Reasons the service withheld output, empty when none were given.
    pub fn filtered_reasons(&self) -> &[String] {
        self.response
            .as_ref()
            .and_then(|r| r.filtered_reasons.as_deref())
            .unwrap_or(&[])
    }

    pub fn failure(&self) -> Option<&ServiceFailure> {
        self.error.as_ref()
    }

    pub fn status(&self) -> OperationStatus {
        OperationStatus::from_handle(self)
    }
}

impl ServiceFailure {
    /// Human-readable text for the failure, falling back to the status field.
    pub fn describe(&self) -> String {
        match (&self.message, &self.status, self.code) {
            (Some(message), _, _) if !message.is_empty() => message.clone(),
            (_, Some(status), _) => status.clone(),
            (_, _, Some(code)) => format!("Operation failed with code {code}"),
            _ => "Operation failed".to_string(),
        }
    }
}

/// `{ "operation": ... }` body exchanged with the edge server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationEnvelope {
    pub operation: OperationHandle,
}

// ---------------------------------------------------------------------------
// Derived status
// ---------------------------------------------------------------------------

/// Snapshot of a handle's state. Terminal iff `done`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationStatus {
    pub done: bool,
    pub result: Option<Vec<ArtifactReference>>,
    pub failure_reason: Option<ServiceFailure>,
}

impl OperationStatus {
    pub fn from_handle(handle: &OperationHandle) -> Self {
        Self {
            done: handle.done,
            result: handle.artifacts(),
            failure_reason: handle.error.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// One produced artifact, referenced by a service-internal locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReference {
    /// Position in the operation's result list.
    pub index: usize,
    pub locator: String,
    pub requires_credential: bool,
}

impl ArtifactReference {
    pub fn new(index: usize, locator: impl Into<String>) -> Self {
        let locator = locator.into();
        let requires_credential = !is_presigned(&locator);
        Self {
            index,
            locator,
            requires_credential,
        }
    }

    /// File name offered to the caller for this artifact.
    pub fn suggested_filename(&self) -> String {
        suggested_filename(self.index)
    }
}

/// File name for the artifact at `index` in a result list.
pub fn suggested_filename(index: usize) -> String {
    format!("video{index}.mp4")
}

/// Whether a locator already carries its own short-lived signature.
fn is_presigned(locator: &str) -> bool {
    match Url::parse(locator) {
        Ok(url) => url
            .query_pairs()
            .any(|(k, _)| PRESIGNED_QUERY_KEYS.iter().any(|p| k.eq_ignore_ascii_case(p))),
        Err(_) => false,
    }
}
