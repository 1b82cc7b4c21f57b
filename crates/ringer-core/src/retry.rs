//! Retry policy: decides whether a failed submission is retried, and after how long.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::BackendError;

/// Extra wait between attempts for the same destination.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryBackoff {
    /// Only the inter-call delay.
    #[default]
    None,

    Fixed { delay_ms: u64 },

    /// `base_ms * multiplier^(attempts - 1)`
    Exponential { base_ms: u64, multiplier: f64 },
}

impl RetryBackoff {
    fn delay(&self, attempts: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Fixed { delay_ms } => Duration::from_millis(*delay_ms),
            Self::Exponential { base_ms, multiplier } => {
                let base_secs = Duration::from_millis(*base_ms).as_secs_f64();
                let exponent = attempts.saturating_sub(1) as i32;
                let secs = base_secs * multiplier.powi(exponent);
                if secs.is_nan() || secs <= 0.0 {
                    return Duration::ZERO;
                }
                Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
            }
        }
    }
}

/// The next action after a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    GiveUp { reason: String },
}

/// Retry policy for one destination.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,

    pub backoff: RetryBackoff,

    /// Self-imposed gap between any two backend calls.
    pub inter_call_delay: Duration,
}

impl RetryPolicy {
    /// No retries, no delay.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: RetryBackoff::None,
            inter_call_delay: Duration::ZERO,
        }
    }

    /// Wait before the next attempt, given `attempts` already made (1-indexed).
    ///
    /// The inter-call delay is a floor: backoff never shortens it.
    pub fn next_delay(&self, attempts: u32) -> Duration {
        self.inter_call_delay.max(self.backoff.delay(attempts))
    }

    /// Pure function of attempt count and error; no side effects.
    pub fn decide(&self, attempts: u32, error: &BackendError) -> RetryDecision {
        if error.kind.is_permanent() {
            return RetryDecision::GiveUp {
                reason: format!("{:?} is not retryable", error.kind),
            };
        }
        if attempts > self.max_retries {
            return RetryDecision::GiveUp {
                reason: format!("max retries reached: {}/{}", attempts - 1, self.max_retries),
            };
        }
        RetryDecision::Retry {
            delay: self.next_delay(attempts),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_retries: u32, backoff: RetryBackoff, inter_call_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff,
            inter_call_delay: Duration::from_millis(inter_call_ms),
        }
    }

    #[test]
    fn default_policy_never_retries() {
        let p = RetryPolicy::default();
        let err = BackendError::unavailable("down");
        assert!(matches!(p.decide(1, &err), RetryDecision::GiveUp { .. }));
    }

    #[test]
    fn retries_until_budget_is_spent() {
        let p = policy(2, RetryBackoff::None, 100);
        let err = BackendError::quota_exceeded("slow down");

        assert_eq!(
            p.decide(1, &err),
            RetryDecision::Retry {
                delay: Duration::from_millis(100)
            }
        );
        assert!(matches!(p.decide(2, &err), RetryDecision::Retry { .. }));
        assert!(matches!(p.decide(3, &err), RetryDecision::GiveUp { .. }));
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let p = policy(5, RetryBackoff::None, 0);
        let err = BackendError::invalid_destination("not a mobile number");
        assert!(matches!(p.decide(1, &err), RetryDecision::GiveUp { .. }));
    }

    #[test]
    fn exponential_backoff_increases() {
        let p = policy(
            5,
            RetryBackoff::Exponential {
                base_ms: 2000,
                multiplier: 2.0,
            },
            0,
        );
        assert_eq!(p.next_delay(1), Duration::from_secs(2));
        assert_eq!(p.next_delay(2), Duration::from_secs(4));
        assert_eq!(p.next_delay(3), Duration::from_secs(8));
    }

    #[test]
    fn inter_call_delay_is_a_floor() {
        let p = policy(1, RetryBackoff::Fixed { delay_ms: 50 }, 200);
        assert_eq!(p.next_delay(1), Duration::from_millis(200));

        let p = policy(1, RetryBackoff::Fixed { delay_ms: 500 }, 200);
        assert_eq!(p.next_delay(1), Duration::from_millis(500));
    }

    #[test]
    fn backoff_deserializes_from_tagged_form() {
        let b: RetryBackoff =
            serde_json::from_str(r#"{"kind":"exponential","base_ms":100,"multiplier":1.5}"#)
                .unwrap();
        assert_eq!(
            b,
            RetryBackoff::Exponential {
                base_ms: 100,
                multiplier: 1.5
            }
        );
    }
}
