//! ringer-twilio
//!
//! `CallingBackend` over the Twilio Programmable Voice REST API.
//!
//! - **credentials**: アカウント SID / Auth Token（Debug では token を伏せる）
//! - **wire**: REST のリソース表現と HTTP エラーの分類
//! - **client**: `TwilioBackend`（reqwest）

pub mod client;
pub mod credentials;
pub mod wire;

pub use client::{DEFAULT_BASE_URL, TwilioBackend, TwilioError};
pub use credentials::{Credentials, CredentialsError};
