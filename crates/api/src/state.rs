use std::sync::Arc;

use vidgen_core::credential::ServerCredential;
use vidgen_genai::api::GenAiApi;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Generation service client.
    pub genai: Arc<GenAiApi>,
    /// Server-held credential, read once at startup. `None` is not fatal at
    /// boot; each request that needs it reports the misconfiguration.
    pub credential: Option<Arc<ServerCredential>>,
}

impl AppState {
    pub fn new(config: ServerConfig, credential: Option<ServerCredential>) -> Self {
        let genai = GenAiApi::new(config.genai.clone());
        Self {
            config: Arc::new(config),
            genai: Arc::new(genai),
            credential: credential.map(Arc::new),
        }
    }

    pub fn credential(&self) -> Option<&ServerCredential> {
        self.credential.as_deref()
    }
}
