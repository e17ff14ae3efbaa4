//! End-to-end generation run: validate, submit once, poll, retrieve.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use vidgen_core::generation::GenerationRequest;

use crate::api::RelayClient;
use crate::error::ClientError;
use crate::poller::{poll_until_terminal, PollConfig};
use crate::retriever::{retrieve_all, RetrievedArtifact};

/// Settings for a single run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory the artifacts are written to.
    pub output_dir: PathBuf,
    pub poll: PollConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            poll: PollConfig::default(),
        }
    }
}

/// What a finished run produced.
#[derive(Debug)]
pub struct GenerationReport {
    pub operation_name: String,
    /// Status queries issued while polling.
    pub poll_attempts: u32,
    pub saved: Vec<RetrievedArtifact>,
    /// Artifacts that could not be retrieved, by index.
    pub failed: Vec<(usize, ClientError)>,
}

/// Run one generation to completion.
///
/// The request is submitted exactly once. Retrieval failures are reported
/// per artifact; the run only fails outright when no artifact was saved.
pub async fn generate_video(
    client: &RelayClient,
    request: &GenerationRequest,
    config: &RunConfig,
    cancel: &CancellationToken,
) -> Result<GenerationReport, ClientError> {
    request.validate()?;

    let handle = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ClientError::Cancelled),
        result = client.generate(request) => result?,
    };
    let operation_name = handle.name().to_string();

    let outcome = poll_until_terminal(client, handle, &config.poll, cancel).await?;

    let mut saved = Vec::new();
    let mut failed = Vec::new();
    for retrieval in retrieve_all(client, &outcome.artifacts, &config.output_dir).await {
        match retrieval.result {
            Ok(artifact) => saved.push(artifact),
            Err(e) => failed.push((retrieval.index, e)),
        }
    }

    if saved.is_empty() {
        if let Some((_, err)) = failed.into_iter().next() {
            return Err(err);
        }
        return Err(ClientError::NoArtifacts { reasons: Vec::new() });
    }

    Ok(GenerationReport {
        operation_name,
        poll_attempts: outcome.attempts,
        saved,
        failed,
    })
}
