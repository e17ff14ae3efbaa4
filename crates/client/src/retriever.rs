//! Concurrent artifact retrieval.
//!
//! Every artifact of a finished job is fetched at the same time and
//! streamed chunk by chunk into `output_dir/video{i}.mp4`. One failed
//! artifact does not affect the others.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use vidgen_core::operation::ArtifactReference;

use crate::api::RelayClient;
use crate::error::ClientError;

/// An artifact written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedArtifact {
    pub index: usize,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Result of retrieving one artifact.
#[derive(Debug)]
pub struct RetrievalResult {
    pub index: usize,
    pub result: Result<RetrievedArtifact, ClientError>,
}

/// Fetch every artifact concurrently into `output_dir`.
///
/// Results come back in the order of `artifacts`.
pub async fn retrieve_all(
    client: &RelayClient,
    artifacts: &[ArtifactReference],
    output_dir: &Path,
) -> Vec<RetrievalResult> {
    let fetches = artifacts.iter().map(|artifact| async move {
        let result = retrieve_one(client, artifact, output_dir).await;
        if let Err(e) = &result {
            tracing::warn!(index = artifact.index, error = %e, "Artifact retrieval failed");
        }
        RetrievalResult {
            index: artifact.index,
            result,
        }
    });
    futures::future::join_all(fetches).await
}

/// Fetch a single artifact. A partially written file is removed on failure.
pub async fn retrieve_one(
    client: &RelayClient,
    artifact: &ArtifactReference,
    output_dir: &Path,
) -> Result<RetrievedArtifact, ClientError> {
    let response = client.download(artifact).await?;

    tokio::fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(artifact.suggested_filename());

    match write_body(response, &path).await {
        Ok(bytes) => {
            tracing::info!(index = artifact.index, path = %path.display(), bytes, "Artifact saved");
            Ok(RetrievedArtifact {
                index: artifact.index,
                path,
                bytes,
            })
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&path).await;
            Err(e)
        }
    }
}

async fn write_body(response: reqwest::Response, path: &Path) -> Result<u64, ClientError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
