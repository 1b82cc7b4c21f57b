//! Dispatch configuration.
//!
//! `DispatchConfig` is the long-lived default set at construction time;
//! `DispatchOptions` overrides it for a single dispatch.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{Message, ValidationError, VoiceOptions};
use crate::retry::{RetryBackoff, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Pause after each destination while more remain.
    pub delay_between_calls_ms: u64,

    pub max_retries_per_destination: u32,

    pub retry_backoff: RetryBackoff,

    /// Stop attempting the rest of the batch once the backend looks down.
    pub fail_fast_on_unavailable: bool,

    pub default_voice: Option<String>,
    pub default_language: Option<String>,
}

/// Per-dispatch overrides. Unset fields fall back to `DispatchConfig`.
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    pub voice: Option<String>,
    pub language: Option<String>,
    pub delay_between_calls: Option<Duration>,
    pub max_retries_per_destination: Option<u32>,
    pub fail_fast_on_unavailable: Option<bool>,

    /// Play markup fetched from this URL instead of the say-envelope.
    pub markup_url: Option<String>,

    /// Relative to the start of the dispatch. Too far out to represent means no deadline.
    pub deadline: Option<Duration>,
}

impl DispatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_delay_between_calls(mut self, delay: Duration) -> Self {
        self.delay_between_calls = Some(delay);
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries_per_destination = Some(retries);
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast_on_unavailable = Some(fail_fast);
        self
    }

    pub fn with_markup_url(mut self, url: impl Into<String>) -> Self {
        self.markup_url = Some(url.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Effective settings for one dispatch.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedOptions {
    pub voice: Option<VoiceOptions>,
    pub markup_url: Option<String>,
    pub delay: Duration,
    pub retry: RetryPolicy,
    pub fail_fast: bool,
    pub deadline: Option<tokio::time::Instant>,
}

impl DispatchConfig {
    pub(crate) fn resolve(&self, options: &DispatchOptions) -> ResolvedOptions {
        let voice = VoiceOptions {
            voice: options.voice.clone().or_else(|| self.default_voice.clone()),
            language: options
                .language
                .clone()
                .or_else(|| self.default_language.clone()),
        };
        let delay = options
            .delay_between_calls
            .unwrap_or(Duration::from_millis(self.delay_between_calls_ms));
        let retry = RetryPolicy {
            max_retries: options
                .max_retries_per_destination
                .unwrap_or(self.max_retries_per_destination),
            backoff: self.retry_backoff.clone(),
            inter_call_delay: delay,
        };
        ResolvedOptions {
            voice: (!voice.is_empty()).then_some(voice),
            markup_url: options.markup_url.clone(),
            delay,
            retry,
            fail_fast: options
                .fail_fast_on_unavailable
                .unwrap_or(self.fail_fast_on_unavailable),
            deadline: options
                .deadline
                .and_then(|d| tokio::time::Instant::now().checked_add(d)),
        }
    }
}

impl ResolvedOptions {
    /// The message every destination gets. A markup URL replaces the template.
    pub(crate) fn message(&self, template: &str) -> Result<Message, ValidationError> {
        match &self.markup_url {
            Some(url) => Message::markup_url(url),
            None => Message::say(template, self.voice.clone()),
        }
    }
}
