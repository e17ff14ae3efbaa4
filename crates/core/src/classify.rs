//! Classification of failures surfaced by submission, polling and retrieval.
//!
//! The generation service reports errors in several shapes: a clean JSON
//! object, a JSON object embedded in a longer message, a JSON string nested
//! inside our own `{ "error": ... }` envelope, or plain text. Classification
//! always tries the structured shapes first and only falls back to substring
//! heuristics when none of them parse.

use serde_json::Value;

use crate::error::CoreError;

/// HTTP-style code the service uses for rate or quota exhaustion.
pub const QUOTA_EXCEEDED_CODE: i64 = 429;

/// Canonical status string for rate or quota exhaustion.
pub const QUOTA_EXCEEDED_STATUS: &str = "RESOURCE_EXHAUSTED";

/// How deep nested `{"error": "<json>"}` strings are unwrapped.
const MAX_NESTING: usize = 3;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credential missing on the server. Fatal, never retried.
    Configuration,
    /// Bad input. No network call was made.
    Validation,
    /// The service reported rate or quota exhaustion.
    QuotaExceeded,
    /// The poll loop hit its attempt or duration ceiling.
    Timeout,
    /// The caller abandoned the job.
    Cancelled,
    /// The job finished without producing any artifact.
    NoArtifacts,
    /// Anything else, including network failures.
    Service,
}

impl ErrorKind {
    /// Stable code used in JSON error bodies.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Configuration => "CONFIGURATION_ERROR",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Cancelled => "CANCELLED",
            ErrorKind::NoArtifacts => "NO_ARTIFACTS",
            ErrorKind::Service => "SERVICE_ERROR",
        }
    }

    /// Whether a user may reasonably try the same action again later.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::QuotaExceeded | ErrorKind::Timeout | ErrorKind::Service
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A failure with its kind and the best human-readable message available.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&CoreError> for ClassifiedError {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => ClassifiedError::new(ErrorKind::Validation, msg.clone()),
            CoreError::Configuration(msg) => {
                ClassifiedError::new(ErrorKind::Configuration, msg.clone())
            }
            CoreError::Internal(msg) => ClassifiedError::new(ErrorKind::Service, msg.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Structured parsing
// ---------------------------------------------------------------------------

/// Fields pulled out of a structured service error.
#[derive(Debug, Default, PartialEq, Eq)]
struct StructuredError {
    code: Option<i64>,
    status: Option<String>,
    message: Option<String>,
}

impl StructuredError {
    fn is_quota(&self) -> bool {
        self.code == Some(QUOTA_EXCEEDED_CODE)
            || self
                .status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(QUOTA_EXCEEDED_STATUS))
    }
}

/// Parse `raw` as JSON, either whole or from the outermost `{...}` slice.
fn parse_json_object(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() {
            return Some(value);
        }
        // A JSON string whose content is itself JSON.
        if let Value::String(inner) = value {
            return parse_json_object(&inner);
        }
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&trimmed[start..=end])
        .ok()
        .filter(Value::is_object)
}

fn extract(value: &Value, depth: usize) -> Option<StructuredError> {
    let inner = match value.get("error") {
        Some(Value::Object(_)) => &value["error"],
        Some(Value::String(nested)) if depth < MAX_NESTING => {
            if let Some(parsed) = parse_json_object(nested) {
                if let Some(found) = extract(&parsed, depth + 1) {
                    return Some(found);
                }
            }
            // Plain-text error field: treat it as the message.
            return Some(StructuredError {
                message: Some(nested.clone()),
                ..Default::default()
            });
        }
        _ => value,
    };

    let code = inner.get("code").and_then(|c| match c {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });
    let status = inner
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_string);
    let message = inner
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string);

    if code.is_none() && status.is_none() && message.is_none() {
        return None;
    }
    Some(StructuredError {
        code,
        status,
        message,
    })
}

fn parse_structured(raw: &str) -> Option<StructuredError> {
    let value = parse_json_object(raw)?;
    extract(&value, 0)
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify an error message reported by the generation service.
///
/// 1. Structured: `error.code == 429` or `error.status == "RESOURCE_EXHAUSTED"`
///    means quota exhaustion; the structured `message` becomes the message.
///    A structure with neither `code` nor `status` gives no signal of its
///    own, so its message goes through the text check of step 2.
/// 2. Fallback, when no structure parses: a case-insensitive `quota`
///    or `429` anywhere in the text means quota exhaustion.
/// 3. Everything else is a generic service error.
pub fn classify_service_error(raw: &str) -> ClassifiedError {
    if let Some(structured) = parse_structured(raw) {
        let message = structured
            .message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| raw.to_string());
        let quota = if structured.code.is_none() && structured.status.is_none() {
            mentions_quota(&message)
        } else {
            structured.is_quota()
        };
        let kind = if quota {
            ErrorKind::QuotaExceeded
        } else {
            ErrorKind::Service
        };
        return ClassifiedError::new(kind, message);
    }

    let kind = if mentions_quota(raw) {
        ErrorKind::QuotaExceeded
    } else {
        ErrorKind::Service
    };
    ClassifiedError::new(kind, raw)
}

fn mentions_quota(text: &str) -> bool {
    let lowered = text.to_lowercase();
    lowered.contains("quota") || lowered.contains("429")
}

/// Best human-readable text for an error message: the structured `message`
/// when one parses, otherwise the raw text.
pub fn friendly_message(raw: &str) -> String {
    parse_structured(raw)
        .and_then(|s| s.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| raw.to_string())
}
