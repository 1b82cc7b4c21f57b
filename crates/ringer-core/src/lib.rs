//! ringer-core
//!
//! Batch voice-notification dispatch over a pluggable calling backend.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（phone, ids, request, markup, outcome, call_state, errors）
//! - **ports**: 抽象化レイヤー（CallingBackend, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（builder, dispatcher, pool, status, cancel, rate_limit）
//! - **impls**: 実装（InMemoryBackend など開発用）
//! - **config** / **retry**: dispatch の設定とリトライ方針
//! - **observability**: 集計ビュー

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod retry;

pub use app::{
    BuildError, CancelHandle, CancelSignal, DispatchReport, Dispatcher, DispatcherBuilder,
    HaltReason, PooledDispatcher, StatusError, StatusObserver,
};
pub use config::{DispatchConfig, DispatchOptions};
pub use domain::{
    BackendCallState, BackendError, BackendErrorKind, CallOutcome, CallRef, DispatchError,
    LookupError, PhoneNumber, SubmissionStatus, ValidationError,
};
pub use ports::{CallingBackend, CreateCall};
