//! Ports - 外部との境界（trait）
//!
//! 発信バックエンド・時刻・ID 生成を trait として抽象化し、
//! Dispatcher はこれらを注入されて動く。テストではダブルに差し替える。

pub mod backend;
pub mod clock;
pub mod id_generator;

pub use self::backend::{CallingBackend, CreateCall};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
