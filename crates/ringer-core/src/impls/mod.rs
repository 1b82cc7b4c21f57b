//! Impls - ports の実装（開発用・テスト用）
//!
//! 本番用のバックエンドは別クレートに配置します：
//! - `ringer-twilio`: Twilio 互換 REST API

pub mod memory;

pub use self::memory::InMemoryBackend;
