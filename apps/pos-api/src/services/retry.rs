//! Deadlock retry.
//!
//! A unit of work that lost a lock race is rolled back by the store; the
//! whole operation is then re-run from the top after a short pause.
//!
//! ```text
//! attempt 1 ── Deadlock ── sleep 10ms
//! attempt 2 ── Deadlock ── sleep 40ms
//! attempt 3 ── Deadlock ── sleep 160ms
//! attempt 4 ── Deadlock ── Unavailable
//! ```

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use tracing::warn;

use samagri_core::{CoreError, CoreResult};

/// How often and how patiently deadlocked work is retried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(10),
            multiplier: 4.0,
        }
    }
}

impl RetryPolicy {
    /// Deterministic schedule: no jitter, no elapsed-time cap.
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_delay)
            .with_multiplier(self.multiplier)
            .with_randomization_factor(0.0)
            .with_max_interval(Duration::from_secs(5))
            .with_max_elapsed_time(None)
            .build()
    }

    /// Runs `work` until it succeeds, fails for a non-retryable reason, or
    /// the retry budget is spent.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut work: F) -> CoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CoreResult<T>>,
    {
        let mut backoff = self.backoff();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let err = match work().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() => err,
                Err(err) => return Err(err),
            };

            let delay = match backoff.next_backoff() {
                Some(delay) if attempt <= self.max_retries => delay,
                _ => {
                    warn!(operation, attempts = attempt, error = %err, "Retry budget exhausted");
                    return Err(CoreError::Unavailable(format!(
                        "{operation} gave up after {attempt} attempts: {err}"
                    )));
                }
            };

            warn!(
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Deadlock, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_schedule_is_10_40_160() {
        let policy = RetryPolicy::default();
        let mut backoff = policy.backoff();
        let delays: Vec<u128> = (0..3)
            .filter_map(|_| backoff.next_backoff())
            .map(|d| d.as_millis())
            .collect();
        assert_eq!(delays, vec![10, 40, 160]);
    }

    #[tokio::test]
    async fn test_gives_up_as_unavailable() {
        let policy = RetryPolicy {
            initial_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        };
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: CoreResult<()> = policy
            .run("test", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(CoreError::Deadlock("row lock".to_string()))
            })
            .await;

        assert!(matches!(result, Err(CoreError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_non_retryable_error_returns_immediately() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: CoreResult<()> = policy
            .run("test", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(CoreError::ProductNotFound(3))
            })
            .await;

        assert!(matches!(result, Err(CoreError::ProductNotFound(3))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_deadlock() {
        let policy = RetryPolicy {
            initial_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        };
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = policy
            .run("test", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(CoreError::Deadlock("first".to_string()))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
