//! Bounded retry policy with jittered exponential back-off.
//!
//! Shared by the session store decorator and the generation adapters.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::trace::TraceEvent;

/// Serializable retry settings as they appear in config files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first one.  `1` disables retries.
    #[serde(default = "d_3")]
    pub max_attempts: u32,
    /// Delay before the first retry.
    #[serde(default = "d_1000")]
    pub min_wait_ms: u64,
    /// Upper bound on any single delay.
    #[serde(default = "d_5000")]
    pub max_wait_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: d_3(),
            min_wait_ms: d_1000(),
            max_wait_ms: d_5000(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            initial_delay: Duration::from_millis(self.min_wait_ms),
            max_delay: Duration::from_millis(self.max_wait_ms.max(self.min_wait_ms)),
            backoff_factor: 2.0,
        }
    }
}

fn d_3() -> u32 {
    3
}
fn d_1000() -> u64 {
    1_000
}
fn d_5000() -> u64 {
    5_000
}

/// Controls how many times and how far apart a failed call is retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between attempts (cap).
    pub max_delay: Duration,
    /// Multiplier applied after each failed attempt.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryConfig::default().policy()
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_factor: 1.0,
        }
    }

    /// Compute the delay after the given failed attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.initial_delay.as_millis() as f64;
        let delay_ms = base_ms * self.backoff_factor.powi(attempt as i32);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);

        // Up to ~25% jitter, still never above the cap.
        let jitter = capped_ms * 0.25 * pseudo_random_fraction(attempt);
        let max_ms = self.max_delay.as_millis() as f64;
        Duration::from_millis((capped_ms + jitter).min(max_ms) as u64)
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// attempt budget is spent.  The last error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt + 1 < self.max_attempts => {
                    let delay = self.delay_for_attempt(attempt);
                    TraceEvent::RetryScheduled {
                        operation: operation.to_owned(),
                        attempt: attempt + 1,
                        delay_ms: delay.as_millis() as u64,
                        error: e.to_string(),
                    }
                    .emit_warn();
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Cheap deterministic "random" fraction [0, 1) based on attempt number.
fn pseudo_random_fraction(attempt: u32) -> f64 {
    let hash = attempt.wrapping_mul(2654435761); // Knuth multiplicative hash
    (hash as f64) / (u32::MAX as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_factor: 2.0,
        }
    }

    #[test]
    fn default_config_values() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.min_wait_ms, 1_000);
        assert_eq!(cfg.max_wait_ms, 5_000);
    }

    #[test]
    fn delay_grows_and_is_capped() {
        let p = RetryConfig::default().policy();
        let d0 = p.delay_for_attempt(0);
        let d1 = p.delay_for_attempt(1);
        assert!(d0 >= Duration::from_millis(1_000));
        assert!(d1 > d0);
        assert!(p.delay_for_attempt(10) <= Duration::from_millis(5_000));
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let cfg = RetryConfig {
            max_attempts: 0,
            min_wait_ms: 10,
            max_wait_ms: 5,
        };
        let p = cfg.policy();
        assert_eq!(p.max_attempts, 1);
        assert_eq!(p.max_delay, Duration::from_millis(10));
    }

    #[tokio::test]
    async fn retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(3)
            .run("flaky", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(Error::StoreUnavailable("refused".into()))
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast_policy(3)
            .run("down", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::StoreUnavailable("refused".into()))
            })
            .await;
        assert!(matches!(result, Err(Error::StoreUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast_policy(5)
            .run("bad", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Store("WRONGTYPE".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
