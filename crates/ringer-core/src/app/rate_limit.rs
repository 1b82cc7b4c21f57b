//! Self-imposed call pacing.
//!
//! - 逐次 dispatch: 宛先ごとに固定の sleep
//! - プール dispatch: 全ワーカーで共有するトークン予算（`RateLimiter`）

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use super::cancel::{CancelSignal, pause};

/// Global call budget: at most one backend call per `interval`, across all holders.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the next free slot. Returns `false` if cancelled first.
    ///
    /// The first caller goes immediately; each later caller is pushed one
    /// interval past the previous reservation.
    pub async fn acquire(&self, cancel: &CancelSignal) -> bool {
        if self.interval.is_zero() {
            return !cancel.is_cancelled();
        }
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.interval);
            slot
        };
        if cancel.is_cancelled() {
            return false;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep_until(slot) => true,
        }
    }
}

/// How a submission waits between retry attempts.
pub(crate) enum Pacer<'a> {
    /// Plain sleep of the policy delay.
    Sleep,
    /// Policy delay beyond the shared interval, then a token.
    Limiter(&'a RateLimiter),
}

impl Pacer<'_> {
    pub(crate) async fn wait(&self, delay: Duration, cancel: &CancelSignal) -> bool {
        match self {
            Self::Sleep => pause(delay, cancel).await,
            Self::Limiter(limiter) => {
                let extra = delay.saturating_sub(limiter.interval());
                pause(extra, cancel).await && limiter.acquire(cancel).await
            }
        }
    }
}
