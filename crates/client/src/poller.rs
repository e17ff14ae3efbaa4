//! Bounded, cancellable poll loop for a single job.
//!
//! The loop waits a fixed interval between status queries and keeps at
//! most one query in flight. It stops on a terminal phase, when the
//! attempt or wall-clock bound is hit, or when the [`CancellationToken`]
//! fires.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use vidgen_core::operation::{ArtifactReference, OperationHandle};
use vidgen_core::polling::{
    PollPhase, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_MAX_POLL_DURATION, DEFAULT_POLL_INTERVAL,
};

use crate::api::RelayClient;
use crate::error::ClientError;

/// Something that can refresh an operation handle.
#[async_trait]
pub trait OperationSource: Send + Sync {
    async fn refresh(&self, handle: &OperationHandle) -> Result<OperationHandle, ClientError>;
}

#[async_trait]
impl OperationSource for RelayClient {
    async fn refresh(&self, handle: &OperationHandle) -> Result<OperationHandle, ClientError> {
        self.status(handle).await
    }
}

/// Poll loop bounds.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before each status query.
    pub interval: Duration,
    /// Status queries allowed before giving up.
    pub max_attempts: u32,
    /// Wall-clock ceiling for the whole loop.
    pub max_duration: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            max_duration: DEFAULT_MAX_POLL_DURATION,
        }
    }
}

/// A job that finished with at least one artifact.
#[derive(Debug, Clone)]
pub struct PolledOutcome {
    pub handle: OperationHandle,
    pub artifacts: Vec<ArtifactReference>,
    /// Status queries issued.
    pub attempts: u32,
}

/// Poll `handle` until it reaches a terminal phase.
///
/// - `DoneSuccess` returns the artifacts
/// - `DoneEmpty` fails with [`ClientError::NoArtifacts`]
/// - `DoneFailure` fails with [`ClientError::Operation`]
/// - a failed status query ends the loop with that error
///
/// `max_duration` also bounds a status query that never answers.
pub async fn poll_until_terminal<S>(
    source: &S,
    handle: OperationHandle,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<PolledOutcome, ClientError>
where
    S: OperationSource + ?Sized,
{
    let deadline = Instant::now() + config.max_duration;
    let mut handle = handle;
    let mut attempts = 0u32;

    loop {
        let phase = PollPhase::evaluate(&handle.status());
        tracing::debug!(operation = handle.name(), attempts, %phase, "Poll phase");

        match phase {
            PollPhase::DoneSuccess => {
                let artifacts = handle.artifacts().unwrap_or_default();
                tracing::info!(
                    operation = handle.name(),
                    attempts,
                    artifact_count = artifacts.len(),
                    "Generation finished",
                );
                return Ok(PolledOutcome {
                    handle,
                    artifacts,
                    attempts,
                });
            }
            PollPhase::DoneEmpty => {
                tracing::warn!(operation = handle.name(), "Generation finished without artifacts");
                return Err(ClientError::NoArtifacts {
                    reasons: handle.filtered_reasons().to_vec(),
                });
            }
            PollPhase::DoneFailure => {
                let failure = handle.failure().cloned().unwrap_or_default();
                tracing::warn!(
                    operation = handle.name(),
                    reason = %failure.describe(),
                    "Generation failed",
                );
                return Err(ClientError::Operation(failure));
            }
            PollPhase::Submitted | PollPhase::Polling => {}
        }

        if attempts >= config.max_attempts || Instant::now() >= deadline {
            return Err(timed_out(&handle, attempts));
        }

        // Wait before the next query, respecting cancellation and the deadline.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(&handle)),
            _ = tokio::time::sleep_until(deadline) => return Err(timed_out(&handle, attempts)),
            _ = tokio::time::sleep(config.interval) => {}
        }

        attempts += 1;
        handle = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(&handle)),
            _ = tokio::time::sleep_until(deadline) => return Err(timed_out(&handle, attempts)),
            result = source.refresh(&handle) => result?,
        };
    }
}

fn timed_out(handle: &OperationHandle, attempts: u32) -> ClientError {
    tracing::warn!(operation = handle.name(), attempts, "Poll bound reached");
    ClientError::Timeout { attempts }
}

fn cancelled(handle: &OperationHandle) -> ClientError {
    tracing::info!(operation = handle.name(), "Polling cancelled");
    ClientError::Cancelled
}
