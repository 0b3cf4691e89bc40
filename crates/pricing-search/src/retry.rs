//! Generic retry-with-backoff helper used by search providers and the
//! URL resolver's redirect-following hop.

use rand::Rng;
use std::time::Duration;

/// Retry policy: attempt ceiling, exponential backoff with jitter, and a
/// per-attempt timeout that grows linearly and is capped.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Ceiling on any single delay.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub backoff_multiplier: f64,
    /// Maximum jitter added to each delay.
    pub jitter: Duration,
    /// Per-attempt timeout for the first attempt; grows linearly per attempt.
    pub base_timeout: Duration,
    /// Ceiling on the per-attempt timeout.
    pub max_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: Duration::from_millis(100),
            base_timeout: Duration::from_secs(3),
            max_timeout: Duration::from_secs(15),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait before the attempt at `attempt_index` (0-based, so
    /// `attempt_index == 0` is the first retry after the initial try).
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let exp = self.backoff_multiplier.powi(attempt_index as i32);
        let scaled = self.initial_delay.mul_f64(exp);
        let capped = std::cmp::min(scaled, self.max_delay);
        let jitter_ms = rand::thread_rng().gen_range(0..=self.jitter.as_millis().max(1) as u64);
        capped + Duration::from_millis(jitter_ms)
    }

    /// Per-attempt timeout at `attempt_index` (0-based), growing linearly
    /// and capped at `max_timeout`.
    pub fn timeout_for(&self, attempt_index: u32) -> Duration {
        let grown = self.base_timeout * (attempt_index + 1);
        std::cmp::min(grown, self.max_timeout)
    }
}

/// Run `operation` up to `policy.max_attempts` times, calling `is_retryable`
/// on each error to decide whether to continue. Returns the last error if
/// every attempt is exhausted or an error is classified as fatal.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: R,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
{
    let mut last_error = None;
    for attempt in 0..policy.max_attempts {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let retryable = is_retryable(&err);
                last_error = Some(err);
                if !retryable || attempt + 1 >= policy.max_attempts {
                    break;
                }
                tokio::time::sleep(policy.delay_for(attempt)).await;
            }
        }
    }
    Err(last_error.expect("at least one attempt always runs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let policy = RetryPolicy { initial_delay: Duration::from_millis(1), ..Default::default() };
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = retry_with_backoff(
            &policy,
            |_attempt| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { if n < 2 { Err("transient") } else { Ok(42) } }
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_on_fatal_error() {
        let policy = RetryPolicy { initial_delay: Duration::from_millis(1), ..Default::default() };
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = retry_with_backoff(
            &policy,
            |_attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err("fatal") }
            },
            |_| false,
        )
        .await;
        assert_eq!(result, Err("fatal"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            ..Default::default()
        };
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = retry_with_backoff(
            &policy,
            |_attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err("transient") }
            },
            |_| true,
        )
        .await;
        assert_eq!(result, Err("transient"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn timeout_grows_linearly_then_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.timeout_for(0), Duration::from_secs(3));
        assert_eq!(policy.timeout_for(1), Duration::from_secs(6));
        assert_eq!(policy.timeout_for(10), policy.max_timeout);
    }
}
