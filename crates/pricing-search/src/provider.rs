//! The `SearchProvider` trait: a uniform adapter over shopping-search
//! engines, with retries, growing per-attempt timeouts, and backoff built
//! in at the call site rather than inside each backend.

use crate::error::{Error, Result};
use crate::offer::Offer;
use crate::retry::{retry_with_backoff, RetryPolicy};
use async_trait::async_trait;

/// A price band the caller wants offers near; purely advisory, providers
/// are free to ignore it and return unfiltered results.
#[derive(Debug, Clone, Copy)]
pub struct PriceBand {
    /// Lower bound, inclusive.
    pub low: f64,
    /// Upper bound, inclusive.
    pub high: f64,
}

/// Uniform interface over shopping-search backends. Implementations should
/// perform exactly one HTTP round trip per call; retry/backoff/timeout
/// policy is applied by [`search_with_retry`], not by the implementation.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name, used in logs and traces.
    fn name(&self) -> &str;

    /// Issue one search attempt. Implementations should map transport/HTTP
    /// failures to [`Error`] so [`Error::is_retryable`] can classify them.
    async fn search_once(&self, query: &str, price_band: Option<PriceBand>) -> Result<Vec<Offer>>;
}

/// Drive a [`SearchProvider`] through [`RetryPolicy`]'s retry/backoff/
/// timeout contract. On total failure, returns an empty offer list rather
/// than propagating the error — callers fall through to the pipeline's
/// next tier, per the "never fails" contract.
pub async fn search_with_retry(
    provider: &dyn SearchProvider,
    policy: &RetryPolicy,
    query: &str,
    price_band: Option<PriceBand>,
) -> Vec<Offer> {
    let outcome = retry_with_backoff(
        policy,
        |attempt| {
            let timeout = policy.timeout_for(attempt);
            async move {
                match tokio::time::timeout(timeout, provider.search_once(query, price_band)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(Error::Transport(format!(
                        "{} timed out after {:?}",
                        provider.name(),
                        timeout
                    ))),
                }
            }
        },
        Error::is_retryable,
    )
    .await;

    match outcome {
        Ok(offers) => offers,
        Err(err) => {
            tracing::warn!(provider = provider.name(), error = %err, "provider_down");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct FlakyProvider {
        calls: AtomicU32,
        fail_times: u32,
    }

    #[async_trait]
    impl SearchProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn search_once(&self, query: &str, _band: Option<PriceBand>) -> Result<Vec<Offer>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                return Err(Error::Transport("temporarily down".into()));
            }
            Ok(vec![Offer {
                title: query.to_string(),
                price: 42.0,
                source: "example.com".to_string(),
                link: None,
                merchants: vec![],
                product_id: None,
                similarity: 0.9,
            }])
        }
    }

    struct AlwaysDownProvider;

    #[async_trait]
    impl SearchProvider for AlwaysDownProvider {
        fn name(&self) -> &str {
            "always-down"
        }

        async fn search_once(&self, _query: &str, _band: Option<PriceBand>) -> Result<Vec<Offer>> {
            Err(Error::Transport("down".into()))
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            base_timeout: Duration::from_secs(1),
            max_timeout: Duration::from_secs(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let provider = FlakyProvider { calls: AtomicU32::new(0), fail_times: 2 };
        let offers = search_with_retry(&provider, &fast_policy(), "vacuum", None).await;
        assert_eq!(offers.len(), 1);
    }

    #[tokio::test]
    async fn returns_empty_on_total_failure_never_errors() {
        let provider = AlwaysDownProvider;
        let offers = search_with_retry(&provider, &fast_policy(), "vacuum", None).await;
        assert!(offers.is_empty());
    }
}
