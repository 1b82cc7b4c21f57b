//! StatusObserver - 通話状態の照会
//!
//! バックエンドへの read-through のみ（キャッシュなし）。
//! ポーリングが必要な呼び出し側向けに `wait_for_terminal` を用意している。

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::{BackendCallState, CallRef, LookupError};
use crate::ports::CallingBackend;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("call {reference} still {last} after {waited:?}")]
    TimedOut {
        reference: CallRef,
        last: BackendCallState,
        waited: Duration,
    },
}

impl StatusError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Lookup(LookupError::NotFound(_)))
    }
}

#[derive(Clone)]
pub struct StatusObserver {
    backend: Arc<dyn CallingBackend>,
}

impl StatusObserver {
    pub fn new(backend: Arc<dyn CallingBackend>) -> Self {
        Self { backend }
    }

    pub async fn fetch_status(&self, reference: &CallRef) -> Result<BackendCallState, LookupError> {
        self.backend.get_call(reference).await
    }

    /// Poll every `poll_interval` until the call reaches a terminal state.
    ///
    /// Lookup errors (including `NotFound`) end the wait immediately.
    pub async fn wait_for_terminal(
        &self,
        reference: &CallRef,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<BackendCallState, StatusError> {
        let start = Instant::now();
        loop {
            let state = self.fetch_status(reference).await?;
            debug!(%reference, %state, "polled call state");
            if state.is_terminal() {
                return Ok(state);
            }
            let waited = start.elapsed();
            if waited + poll_interval > timeout {
                return Err(StatusError::TimedOut {
                    reference: reference.clone(),
                    last: state,
                    waited,
                });
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}
