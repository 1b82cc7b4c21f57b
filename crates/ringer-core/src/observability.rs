use serde::{Deserialize, Serialize};

use crate::domain::{CallOutcome, FailureKind};

/// Summary of a dispatch report, for logs and CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchCounts {
    pub queued: usize,
    /// Attempted and rejected by the backend.
    pub failed: usize,
    /// Never handed to the backend (cancelled, deadline, fail-fast).
    pub not_attempted: usize,
}

impl DispatchCounts {
    pub fn from_outcomes(outcomes: &[CallOutcome]) -> Self {
        let mut counts = Self::default();
        for outcome in outcomes {
            match outcome.failure() {
                None => counts.queued += 1,
                Some(FailureKind::Backend(_)) => counts.failed += 1,
                Some(FailureKind::Cancelled | FailureKind::Skipped) => counts.not_attempted += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.queued + self.failed + self.not_attempted
    }
}
