//! Poll-loop phases and bounds.
//!
//! The loop itself lives in `vidgen-client`; this module holds the pure
//! state transition so it can be tested without a clock or a network.

use std::time::Duration;

use crate::operation::OperationStatus;

/// Fixed delay between two status queries for the same job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Status queries allowed before a job is declared stuck.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 90;

/// Wall-clock ceiling for a single job's poll loop.
pub const DEFAULT_MAX_POLL_DURATION: Duration = Duration::from_secs(20 * 60);

/// Phase of a single job's lifecycle as seen by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// Handle issued, not yet inspected.
    Submitted,
    /// Not done; keep querying.
    Polling,
    /// Done with at least one artifact.
    DoneSuccess,
    /// Done, but the artifact list is empty or absent.
    DoneEmpty,
    /// Done with a service-reported failure, or a status query failed.
    DoneFailure,
}

impl PollPhase {
    /// Phase implied by a status snapshot.
    pub fn evaluate(status: &OperationStatus) -> Self {
        if !status.done {
            return PollPhase::Polling;
        }
        if status.failure_reason.is_some() {
            return PollPhase::DoneFailure;
        }
        match &status.result {
            Some(artifacts) if !artifacts.is_empty() => PollPhase::DoneSuccess,
            _ => PollPhase::DoneEmpty,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PollPhase::DoneSuccess | PollPhase::DoneEmpty | PollPhase::DoneFailure
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PollPhase::Submitted => "submitted",
            PollPhase::Polling => "polling",
            PollPhase::DoneSuccess => "done_success",
            PollPhase::DoneEmpty => "done_empty",
            PollPhase::DoneFailure => "done_failure",
        }
    }
}

impl std::fmt::Display for PollPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
