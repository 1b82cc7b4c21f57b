//! Result of one dispatch.

use serde::Serialize;

use crate::domain::{BatchId, CallOutcome, FailureKind, PhoneNumber};
use crate::observability::DispatchCounts;

/// Why a dispatch stopped attempting destinations before the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    Cancelled,
    DeadlineExceeded,
    /// Fail-fast mode saw an authentication or availability failure.
    BackendUnavailable,
}

impl HaltReason {
    /// Outcome for a destination left behind by this halt.
    pub(crate) fn not_attempted(self, index: usize, destination: PhoneNumber) -> CallOutcome {
        let (failure, detail) = match self {
            Self::Cancelled => (FailureKind::Cancelled, "not attempted: dispatch cancelled"),
            Self::DeadlineExceeded => (
                FailureKind::Cancelled,
                "not attempted: dispatch deadline exceeded",
            ),
            Self::BackendUnavailable => (
                FailureKind::Skipped,
                "not attempted: backend unavailable (fail-fast)",
            ),
        };
        CallOutcome::not_attempted(index, destination, failure, detail)
    }
}

/// Outcomes in input order, one per destination.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    batch_id: BatchId,
    counts: DispatchCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    halted: Option<HaltReason>,
    outcomes: Vec<CallOutcome>,
}

impl DispatchReport {
    pub(crate) fn new(
        batch_id: BatchId,
        outcomes: Vec<CallOutcome>,
        halted: Option<HaltReason>,
    ) -> Self {
        Self {
            batch_id,
            counts: DispatchCounts::from_outcomes(&outcomes),
            halted,
            outcomes,
        }
    }

    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    pub fn outcomes(&self) -> &[CallOutcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<CallOutcome> {
        self.outcomes
    }

    pub fn counts(&self) -> DispatchCounts {
        self.counts
    }

    pub fn halted(&self) -> Option<HaltReason> {
        self.halted
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
