//! InMemoryBackend - 開発用・テスト用の発信バックエンド
//!
//! # 特徴
//! - 参照は `CA` + 連番（32 桁 hex）で決定的
//! - 宛先ごとに失敗を仕込める（次の N 回 / 常に）
//! - create_call の呼び出し回数を数える（バリデーション失敗時に 0 回であることの確認用）
//! - get_call 用の状態表を持ち、`set_state` で遷移させられる

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::{BackendCallState, BackendError, CallRef, LookupError, PhoneNumber};
use crate::ports::{CallingBackend, CreateCall};

#[derive(Default)]
struct State {
    next_seq: u64,
    create_attempts: usize,
    /// Successfully queued calls, in submission order.
    accepted: Vec<(CallRef, CreateCall)>,
    calls: HashMap<CallRef, BackendCallState>,
    fail_next: HashMap<PhoneNumber, VecDeque<BackendError>>,
    fail_always: HashMap<PhoneNumber, BackendError>,
}

#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail the next submission to `destination` with `error` (queued per call).
    pub fn fail_next(&self, destination: &PhoneNumber, error: BackendError) {
        self.lock()
            .fail_next
            .entry(destination.clone())
            .or_default()
            .push_back(error);
    }

    /// Fail every submission to `destination`.
    pub fn fail_always(&self, destination: &PhoneNumber, error: BackendError) {
        self.lock().fail_always.insert(destination.clone(), error);
    }

    /// Number of `create_call` invocations, successful or not.
    pub fn create_attempts(&self) -> usize {
        self.lock().create_attempts
    }

    /// Calls that were queued, in order.
    pub fn accepted(&self) -> Vec<(CallRef, CreateCall)> {
        self.lock().accepted.clone()
    }

    /// Move a known call to `state`. Returns `false` for unknown references.
    pub fn set_state(&self, reference: &CallRef, state: BackendCallState) -> bool {
        match self.lock().calls.get_mut(reference) {
            Some(current) => {
                *current = state;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl CallingBackend for InMemoryBackend {
    async fn create_call(&self, call: &CreateCall) -> Result<CallRef, BackendError> {
        let mut state = self.lock();
        state.create_attempts += 1;

        if let Some(error) = state
            .fail_next
            .get_mut(&call.to)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }
        if let Some(error) = state.fail_always.get(&call.to) {
            return Err(error.clone());
        }

        state.next_seq += 1;
        let reference = CallRef::new(format!("CA{:032x}", state.next_seq));
        state.calls.insert(reference.clone(), BackendCallState::Queued);
        state.accepted.push((reference.clone(), call.clone()));
        Ok(reference)
    }

    async fn get_call(&self, reference: &CallRef) -> Result<BackendCallState, LookupError> {
        self.lock()
            .calls
            .get(reference)
            .copied()
            .ok_or_else(|| LookupError::NotFound(reference.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessagePayload;

    fn call(to: &str) -> CreateCall {
        CreateCall {
            to: PhoneNumber::parse(to).unwrap(),
            from: PhoneNumber::parse("+15550009999").unwrap(),
            payload: MessagePayload::say("hi", None),
        }
    }

    #[tokio::test]
    async fn references_are_sequential_and_queued() {
        let backend = InMemoryBackend::new();
        let r1 = backend.create_call(&call("+15550000001")).await.unwrap();
        let r2 = backend.create_call(&call("+15550000002")).await.unwrap();

        assert_eq!(r1.as_str(), format!("CA{:032x}", 1));
        assert_eq!(r2.as_str(), format!("CA{:032x}", 2));
        assert_eq!(backend.get_call(&r1).await.unwrap(), BackendCallState::Queued);
        assert_eq!(backend.accepted().len(), 2);
    }

    #[tokio::test]
    async fn fail_next_is_consumed_once() {
        let backend = InMemoryBackend::new();
        let c = call("+15550000001");
        backend.fail_next(&c.to, BackendError::unavailable("blip"));

        assert!(backend.create_call(&c).await.is_err());
        assert!(backend.create_call(&c).await.is_ok());
        assert_eq!(backend.create_attempts(), 2);
    }

    #[tokio::test]
    async fn fail_always_keeps_failing() {
        let backend = InMemoryBackend::new();
        let c = call("+15550000001");
        backend.fail_always(&c.to, BackendError::invalid_destination("landline"));

        for _ in 0..3 {
            let err = backend.create_call(&c).await.unwrap_err();
            assert_eq!(err.detail, "landline");
        }
        assert!(backend.accepted().is_empty());
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let backend = InMemoryBackend::new();
        let missing = CallRef::new("CA-missing");
        let err = backend.get_call(&missing).await.unwrap_err();
        assert_eq!(err, LookupError::NotFound(missing.clone()));
        assert!(!backend.set_state(&missing, BackendCallState::Completed));
    }

    #[tokio::test]
    async fn set_state_moves_known_calls() {
        let backend = InMemoryBackend::new();
        let r = backend.create_call(&call("+15550000001")).await.unwrap();
        assert!(backend.set_state(&r, BackendCallState::InProgress));
        assert_eq!(
            backend.get_call(&r).await.unwrap(),
            BackendCallState::InProgress
        );
    }
}
