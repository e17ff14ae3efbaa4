//! Client configuration loaded from environment variables.

/// Environment variable naming the edge server base URL.
pub const SERVER_URL_ENV_VAR: &str = "VIDGEN_SERVER_URL";

/// Edge server used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Where the client finds the edge server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the edge server, without a trailing slash.
    pub server_url: String,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        let server_url = server_url.into();
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    /// Load from the environment.
    ///
    /// | Env var             | Default                 |
    /// |---------------------|-------------------------|
    /// | `VIDGEN_SERVER_URL` | `http://localhost:3000` |
    pub fn from_env() -> Self {
        let server_url = std::env::var(SERVER_URL_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        Self::new(server_url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}
