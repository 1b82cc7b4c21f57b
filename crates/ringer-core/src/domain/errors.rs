//! Errors - エラー型と分類
//!
//! - `ValidationError`: バッチ投入前の入力検証（1件でも不正ならバッチ全体を拒否）
//! - `BackendError`: バックエンドが個別の発信を拒否した（宛先ごとに隔離）
//! - `LookupError`: 通話状態の照会失敗（NotFound を含む）
//! - `DispatchError`: dispatch 全体の失敗

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::CallRef;
use super::phone::PhoneNumberError;

/// Input rejected before any backend call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message template is empty")]
    EmptyTemplate,

    #[error("destination #{index} ({value:?}) is invalid: {source}")]
    InvalidDestination {
        index: usize,
        value: String,
        #[source]
        source: PhoneNumberError,
    },

    #[error("markup url {value:?} is invalid: {reason}")]
    InvalidMarkupUrl { value: String, reason: String },
}

/// Classification of a backend submission failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    /// Backend refused the destination number.
    InvalidDestination,
    /// Rate limit or account quota hit.
    QuotaExceeded,
    /// Credentials rejected.
    Authentication,
    /// Backend unreachable or failing server-side.
    Unavailable,
    /// Any other rejection of the request.
    Rejected,
}

impl BackendErrorKind {
    /// Failures so severe that further submissions are unlikely to succeed.
    pub fn is_unavailable(self) -> bool {
        matches!(self, Self::Authentication | Self::Unavailable)
    }

    /// Retrying cannot change the result.
    pub fn is_permanent(self) -> bool {
        matches!(self, Self::InvalidDestination | Self::Authentication)
    }
}

/// A backend rejected (or could not receive) one create-call request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {detail}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub detail: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn invalid_destination(detail: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::InvalidDestination, detail)
    }

    pub fn quota_exceeded(detail: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::QuotaExceeded, detail)
    }

    pub fn authentication(detail: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Authentication, detail)
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Unavailable, detail)
    }

    pub fn rejected(detail: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Rejected, detail)
    }
}

/// Failure of a call-state lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("call {0} not found")]
    NotFound(CallRef),

    #[error("lookup failed: {0}")]
    Backend(#[from] BackendError),
}

/// Failure of a whole dispatch.
///
/// Per-destination failures are never reported here; they live in the
/// destination's `CallOutcome`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("dispatch worker failed: {0}")]
    Worker(String),
}
