// Retry logic for outbound network calls
use crate::config::RetrySettings;
use crate::error::Result;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Retry policy shared by every outbound network call
///
/// Attempt `n` (1-based) that fails is followed by a wait of
/// `(2^n + jitter) * unit`, jitter drawn uniformly from `[0, 1)`.
/// After `max_attempts` failures the last error is returned.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    unit: Duration,
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `max_attempts` - Total attempts including the first (clamped to >= 1)
    /// * `unit` - Backoff time unit (1s in production)
    ///
    /// # Example
    /// ```text
    /// let policy = RetryPolicy::new(3, Duration::from_secs(1));
    /// ```
    pub fn new(max_attempts: u32, unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            unit,
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(settings.max_attempts, settings.unit)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Lower bound of the wait after failed attempt `attempt`: `2^attempt` units
    pub fn min_delay(&self, attempt: u32) -> Duration {
        self.delay_with_jitter(attempt, 0.0)
    }

    /// Wait after failed attempt `attempt` for a given jitter in `[0, 1)`
    pub fn delay_with_jitter(&self, attempt: u32, jitter: f64) -> Duration {
        let factor = 2f64.powi(attempt as i32) + jitter.clamp(0.0, 1.0);
        self.unit.mul_f64(factor)
    }

    /// Randomized wait after failed attempt `attempt`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let jitter: f64 = rand::thread_rng().gen_range(0.0..1.0);
        self.delay_with_jitter(attempt, jitter)
    }

    /// Run `op` until it succeeds or attempts are exhausted
    ///
    /// # Example
    /// ```text
    /// let jobs = policy.run("list_candidates", || store.list_candidates(&status, 100)).await?;
    /// ```
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => {
                    warn!(
                        operation = %operation,
                        attempts = %attempt,
                        error = %e,
                        "Retry attempts exhausted"
                    );
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        operation = %operation,
                        attempt = %attempt,
                        max_attempts = %self.max_attempts,
                        delay_ms = %delay.as_millis(),
                        error = %e,
                        "Operation failed, retrying after backoff"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_micros(10))
    }

    #[test]
    fn test_min_delay_is_power_of_two_and_strictly_increasing() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        let mut previous = Duration::ZERO;
        for attempt in 1..=5u32 {
            let min = policy.min_delay(attempt);
            assert_eq!(min, Duration::from_secs(2u64.pow(attempt)));
            assert!(min > previous);
            previous = min;
        }
    }

    #[test]
    fn test_backoff_delay_within_jitter_window() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        for attempt in 1..=3u32 {
            let low = Duration::from_secs(2u64.pow(attempt));
            let high = Duration::from_secs(2u64.pow(attempt) + 1);
            for _ in 0..200 {
                let delay = policy.backoff_delay(attempt);
                assert!(delay >= low && delay < high, "attempt {} delay {:?}", attempt, delay);
            }
        }
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::from_secs(1)).max_attempts(), 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = fast_policy(3)
            .run("op", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(AppError::Network(format!("attempt {}", n)))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_final_error_propagates_after_exhaustion() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = fast_policy(3)
            .run("op", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Err(AppError::Network(format!("attempt {}", n)))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(AppError::Network(msg)) => assert_eq!(msg, "attempt 3"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_single_attempt_does_not_retry() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let _: Result<()> = fast_policy(1)
            .run("op", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Network("down".to_string()))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
