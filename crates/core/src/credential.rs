//! The server-held credential.
//!
//! [`ServerCredential`] is loaded once per process and only ever read. It
//! does not implement `Serialize`, and its `Debug`/`Display` output is
//! masked, so it cannot end up in a response body or a log line by accident.
//! Locators are authorized inside the boundary with
//! [`ServerCredential::authorize_locator`]; the resulting URL must never be
//! returned or logged.

use std::fmt;

use url::Url;

use crate::error::CoreError;

/// Environment variable holding the credential.
pub const CREDENTIAL_ENV_VAR: &str = "API_KEY";

/// Query parameter the service expects the credential in.
pub const CREDENTIAL_QUERY_PARAM: &str = "key";

/// Replacement text for a scrubbed credential.
pub const REDACTED: &str = "[REDACTED]";

#[derive(Clone, PartialEq, Eq)]
pub struct ServerCredential(String);

impl ServerCredential {
    /// Wrap a secret. Blank values are treated as absent.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        let trimmed = secret.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Read the credential from [`CREDENTIAL_ENV_VAR`].
    pub fn from_env() -> Option<Self> {
        std::env::var(CREDENTIAL_ENV_VAR).ok().and_then(Self::new)
    }

    /// The raw secret, for request headers only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Append the credential to a service locator.
    pub fn authorize_locator(&self, locator: &str) -> Result<Url, CoreError> {
        let mut url = Url::parse(locator)
            .map_err(|e| CoreError::Validation(format!("Invalid artifact locator: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::Validation(format!(
                "Unsupported artifact locator scheme '{}'",
                url.scheme()
            )));
        }
        url.query_pairs_mut()
            .append_pair(CREDENTIAL_QUERY_PARAM, &self.0);
        Ok(url)
    }

    /// Replace every occurrence of the secret in `text`.
    pub fn redact(&self, text: &str) -> String {
        text.replace(&self.0, REDACTED)
    }
}

impl fmt::Debug for ServerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerCredential(***)")
    }
}

impl fmt::Display for ServerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Error returned whenever an operation needs the credential and none is set.
pub fn missing_credential() -> CoreError {
    CoreError::Configuration("API key not set".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn blank_secret_is_absent() {
        assert!(ServerCredential::new("").is_none());
        assert!(ServerCredential::new("   ").is_none());
        assert!(ServerCredential::new("k").is_some());
    }

    #[test]
    fn debug_and_display_are_masked() {
        let c = ServerCredential::new("sk-live-123").unwrap();
        assert!(!format!("{c:?}").contains("sk-live-123"));
        assert!(!format!("{c}").contains("sk-live-123"));
    }

    #[test]
    fn authorize_appends_key_to_existing_query() {
        let c = ServerCredential::new("secret").unwrap();
        let url = c
            .authorize_locator("https://svc.example/v1beta/files/abc:download?alt=media")
            .unwrap();
        assert_eq!(url.query(), Some("alt=media&key=secret"));
        assert_eq!(url.path(), "/v1beta/files/abc:download");
    }

    #[test]
    fn authorize_without_query() {
        let c = ServerCredential::new("secret").unwrap();
        let url = c.authorize_locator("https://svc.example/file").unwrap();
        assert_eq!(url.as_str(), "https://svc.example/file?key=secret");
    }

    #[test]
    fn authorize_rejects_non_http_locators() {
        let c = ServerCredential::new("secret").unwrap();
        assert_matches!(c.authorize_locator("file:///etc/passwd"), Err(CoreError::Validation(_)));
        assert_matches!(c.authorize_locator("not a url"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn redact_scrubs_every_occurrence() {
        let c = ServerCredential::new("abc123").unwrap();
        let scrubbed = c.redact("GET https://x/?key=abc123 failed; key abc123");
        assert!(!scrubbed.contains("abc123"));
        assert_eq!(scrubbed.matches(REDACTED).count(), 2);
    }
}
