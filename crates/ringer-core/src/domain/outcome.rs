//! Outcome model: per-destination result of a submission.
//!
//! An outcome is created once, when the destination has been attempted (or
//! skipped), and never mutated afterwards. Constructors enforce the pairing
//! rule: a backend reference is present iff the call was queued, and an error
//! detail is present iff it was not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{BackendError, BackendErrorKind};
use super::ids::CallRef;
use super::phone::PhoneNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Backend accepted the request. Says nothing about whether the call connected.
    Queued,
    FailedToSubmit,
}

/// Why a destination ended up `FailedToSubmit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The backend rejected every attempt.
    Backend(BackendErrorKind),

    /// Cancelled or past the deadline before this destination was attempted.
    Cancelled,

    /// Skipped because fail-fast mode saw the backend become unavailable.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOutcome {
    index: usize,
    destination: PhoneNumber,
    status: SubmissionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    backend_reference: Option<CallRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure: Option<FailureKind>,

    /// Backend calls made for this destination (0 when never attempted).
    attempts: u32,

    /// Time of the last attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attempted_at: Option<DateTime<Utc>>,
}

impl CallOutcome {
    pub fn queued(
        index: usize,
        destination: PhoneNumber,
        reference: CallRef,
        attempts: u32,
        attempted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            destination,
            status: SubmissionStatus::Queued,
            backend_reference: Some(reference),
            error_detail: None,
            failure: None,
            attempts,
            attempted_at: Some(attempted_at),
        }
    }

    pub fn failed(
        index: usize,
        destination: PhoneNumber,
        error: &BackendError,
        attempts: u32,
        attempted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            destination,
            status: SubmissionStatus::FailedToSubmit,
            backend_reference: None,
            error_detail: Some(error.detail.clone()),
            failure: Some(FailureKind::Backend(error.kind)),
            attempts,
            attempted_at: Some(attempted_at),
        }
    }

    /// Destination that was never handed to the backend.
    pub fn not_attempted(
        index: usize,
        destination: PhoneNumber,
        failure: FailureKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            index,
            destination,
            status: SubmissionStatus::FailedToSubmit,
            backend_reference: None,
            error_detail: Some(detail.into()),
            failure: Some(failure),
            attempts: 0,
            attempted_at: None,
        }
    }

    /// Position of the destination in the dispatch input.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn destination(&self) -> &PhoneNumber {
        &self.destination
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn is_queued(&self) -> bool {
        self.status == SubmissionStatus::Queued
    }

    pub fn backend_reference(&self) -> Option<&CallRef> {
        self.backend_reference.as_ref()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn failure(&self) -> Option<FailureKind> {
        self.failure
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn attempted_at(&self) -> Option<DateTime<Utc>> {
        self.attempted_at
    }

    /// Failed with an error that suggests the backend as a whole is down.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self.failure, Some(FailureKind::Backend(kind)) if kind.is_unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest() -> PhoneNumber {
        PhoneNumber::parse("+15550000001").unwrap()
    }

    #[test]
    fn queued_has_reference_and_no_error() {
        let o = CallOutcome::queued(0, dest(), CallRef::new("CA1"), 1, Utc::now());
        assert!(o.is_queued());
        assert_eq!(o.backend_reference().map(CallRef::as_str), Some("CA1"));
        assert!(o.error_detail().is_none());
        assert!(o.failure().is_none());
    }

    #[test]
    fn failed_has_error_and_no_reference() {
        let err = BackendError::quota_exceeded("too many requests");
        let o = CallOutcome::failed(1, dest(), &err, 3, Utc::now());
        assert_eq!(o.status(), SubmissionStatus::FailedToSubmit);
        assert!(o.backend_reference().is_none());
        assert_eq!(o.error_detail(), Some("too many requests"));
        assert_eq!(
            o.failure(),
            Some(FailureKind::Backend(BackendErrorKind::QuotaExceeded))
        );
        assert_eq!(o.attempts(), 3);
        assert!(!o.is_backend_unavailable());
    }

    #[test]
    fn not_attempted_records_zero_attempts() {
        let o = CallOutcome::not_attempted(2, dest(), FailureKind::Cancelled, "cancelled");
        assert_eq!(o.attempts(), 0);
        assert!(o.attempted_at().is_none());
        assert_eq!(o.error_detail(), Some("cancelled"));
    }

    #[test]
    fn status_serializes_snake_case() {
        let o = CallOutcome::queued(0, dest(), CallRef::new("CA1"), 1, Utc::now());
        let v = serde_json::to_value(&o).unwrap();
        assert_eq!(v["status"], "queued");
        assert_eq!(v["backend_reference"], "CA1");
        assert!(v.get("error_detail").is_none());

        let s = serde_json::to_string(&SubmissionStatus::FailedToSubmit).unwrap();
        assert_eq!(s, "\"failed_to_submit\"");
    }
}
