//! CallingBackend port - 発信プラットフォームへのインターフェース
//!
//! 本番実装は `ringer-twilio` クレート、開発・テスト用は
//! `impls::InMemoryBackend`。

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{BackendCallState, BackendError, CallRef, LookupError, MessagePayload, PhoneNumber};

/// One create-call request as the backend sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCall {
    pub to: PhoneNumber,
    /// Caller id presented to the callee.
    pub from: PhoneNumber,
    pub payload: MessagePayload,
}

/// The telephony platform, seen from the client side.
///
/// # Thread Safety
/// - `Send + Sync`: a single handle is shared by every dispatch worker
/// - implementations hold credentials read-only after construction
#[async_trait]
pub trait CallingBackend: Send + Sync {
    /// Submit a call. `Ok` means queued on the backend, not connected.
    async fn create_call(&self, call: &CreateCall) -> Result<CallRef, BackendError>;

    /// Read the backend's current view of a call.
    async fn get_call(&self, reference: &CallRef) -> Result<BackendCallState, LookupError>;
}

#[async_trait]
impl<B: CallingBackend + ?Sized> CallingBackend for Arc<B> {
    async fn create_call(&self, call: &CreateCall) -> Result<CallRef, BackendError> {
        (**self).create_call(call).await
    }

    async fn get_call(&self, reference: &CallRef) -> Result<BackendCallState, LookupError> {
        (**self).get_call(reference).await
    }
}
