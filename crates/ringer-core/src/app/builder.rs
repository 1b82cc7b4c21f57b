//! DispatcherBuilder - Dispatcher の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - build() 時に必須項目（backend, caller_id）の有無と caller_id の形式を検証
//! - 不足・不正があれば BuildError を返す（発信前に気付ける）

use std::sync::Arc;

use crate::config::DispatchConfig;
use crate::domain::{PhoneNumber, PhoneNumberError};
use crate::ports::{CallingBackend, Clock, IdGenerator, SystemClock, UlidGenerator};

use super::dispatcher::Dispatcher;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no calling backend configured")]
    MissingBackend,

    #[error("no caller id configured")]
    MissingCallerId,

    #[error("caller id {value:?} is invalid: {source}")]
    InvalidCallerId {
        value: String,
        #[source]
        source: PhoneNumberError,
    },
}

/// # 使用例
/// ```ignore
/// let dispatcher = DispatcherBuilder::new()
///     .backend(Arc::new(backend))
///     .caller_id("+15559990000")
///     .config(config)
///     .build()?;
/// ```
#[derive(Default)]
pub struct DispatcherBuilder {
    backend: Option<Arc<dyn CallingBackend>>,
    caller_id: Option<String>,
    config: DispatchConfig,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(mut self, backend: Arc<dyn CallingBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Origin number presented to callees. Validated in `build()`.
    pub fn caller_id(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }

    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Defaults to `SystemClock`.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Defaults to a ULID generator on the configured clock.
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn build(self) -> Result<Dispatcher, BuildError> {
        let backend = self.backend.ok_or(BuildError::MissingBackend)?;
        let raw = self.caller_id.ok_or(BuildError::MissingCallerId)?;
        let caller_id = PhoneNumber::parse(&raw)
            .map_err(|source| BuildError::InvalidCallerId { value: raw, source })?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));

        Ok(Dispatcher::from_parts(
            backend,
            caller_id,
            self.config,
            clock,
            ids,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryBackend;

    #[test]
    fn build_success() {
        let d = DispatcherBuilder::new()
            .backend(Arc::new(InMemoryBackend::new()))
            .caller_id("+15559990000")
            .build()
            .unwrap();
        assert_eq!(d.caller_id().as_str(), "+15559990000");
        assert_eq!(d.config(), &DispatchConfig::default());
    }

    #[test]
    fn build_without_backend() {
        let r = DispatcherBuilder::new().caller_id("+15559990000").build();
        assert!(matches!(r, Err(BuildError::MissingBackend)));
    }

    #[test]
    fn build_without_caller_id() {
        let r = DispatcherBuilder::new()
            .backend(Arc::new(InMemoryBackend::new()))
            .build();
        assert!(matches!(r, Err(BuildError::MissingCallerId)));
    }

    #[test]
    fn build_with_malformed_caller_id() {
        let r = DispatcherBuilder::new()
            .backend(Arc::new(InMemoryBackend::new()))
            .caller_id("555-0100")
            .build();
        assert!(matches!(
            r,
            Err(BuildError::InvalidCallerId { source: PhoneNumberError::MissingPlus, .. })
        ));
    }
}
