use url::Url;

/// Default REST base URL of the generation service.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default video generation model.
pub const DEFAULT_MODEL: &str = "veo-2.0-generate-001";

/// Connection settings for the generation service.
#[derive(Debug, Clone)]
pub struct GenAiConfig {
    /// REST base URL, without a trailing slash.
    pub base_url: String,
    /// Model identifier used for submissions.
    pub model: String,
    /// Hosts artifact locators may point at. The server credential is only
    /// ever appended to locators on these hosts.
    pub artifact_hosts: Vec<String>,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_MODEL)
    }
}

impl GenAiConfig {
    /// Build a config whose artifact host allow-list is the base URL's host.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let artifact_hosts = Url::parse(&base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .into_iter()
            .collect();
        Self {
            base_url,
            model: model.into(),
            artifact_hosts,
        }
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                          |
    /// |-------------------------|----------------------------------|
    /// | `GENAI_BASE_URL`        | [`DEFAULT_BASE_URL`]             |
    /// | `GENAI_MODEL`           | [`DEFAULT_MODEL`]                |
    /// | `GENAI_ARTIFACT_HOSTS`  | host of `GENAI_BASE_URL`         |
    pub fn from_env() -> Self {
        let base_url = std::env::var("GENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = std::env::var("GENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());

        let mut config = Self::new(base_url, model);
        if let Ok(extra) = std::env::var("GENAI_ARTIFACT_HOSTS") {
            config.artifact_hosts.extend(
                extra
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
            );
        }
        config
    }

    /// Whether `locator` is an http(s) URL on an allowed artifact host.
    pub fn allows_artifact_locator(&self, locator: &str) -> bool {
        let Ok(url) = Url::parse(locator) else {
            return false;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        url.host_str().is_some_and(|host| {
            self.artifact_hosts
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(host))
        })
    }
}
