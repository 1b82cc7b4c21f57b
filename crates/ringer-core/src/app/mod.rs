//! App - アプリケーション層
//!
//! ports を組み合わせて dispatch のロジックを実装します。
//!
//! # 主要コンポーネント
//! - **DispatcherBuilder**: 構築とワイヤリング
//! - **Dispatcher**: 逐次 dispatch（基準実装）
//! - **PooledDispatcher**: ワーカープール版
//! - **StatusObserver**: 通話状態の照会
//! - **CancelHandle / CancelSignal**: 宛先間でのキャンセル

pub mod builder;
pub mod cancel;
pub mod dispatcher;
pub mod pool;
pub mod rate_limit;
pub mod report;
pub mod status;

pub use self::builder::{BuildError, DispatcherBuilder};
pub use self::cancel::{CancelHandle, CancelSignal};
pub use self::dispatcher::Dispatcher;
pub use self::pool::{PooledDispatcher, ZeroWorkers};
pub use self::rate_limit::RateLimiter;
pub use self::report::{DispatchReport, HaltReason};
pub use self::status::{StatusError, StatusObserver};
