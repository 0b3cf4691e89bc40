//! Bounded worker pool with adaptive throttling (spec §4.10).
//!
//! Decoupled from `PricingPipeline` by design: the scheduler only knows how
//! to fan a list of inputs out across bounded concurrency, call back on
//! per-item progress, and adapt its inter-batch delay to a failure signal
//! the caller defines. `PricingPipeline::run_row` is just the closure it drives.

use crate::config::SchedulerConfig;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Progress emitted after every completed item.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    /// Items completed so far, across all batches.
    pub processed: usize,
    /// Total items in this job.
    pub total: usize,
    /// Wall-clock time elapsed since the job started.
    pub elapsed: Duration,
}

/// Choose batch size and concurrency from the total item count (spec §4.10):
/// small jobs run serially, medium jobs fan out aggressively, large jobs
/// trade batch size for a lower concurrency ceiling.
#[must_use]
pub fn batch_plan(total: usize, config: &SchedulerConfig) -> (usize, usize) {
    let (batch_size, concurrency) = if total <= 20 {
        (1, 1)
    } else if total <= 100 {
        (1, 15)
    } else {
        (2, 10)
    };
    (batch_size, concurrency.min(config.max_concurrency))
}

/// Drives a bounded-concurrency pass over a list of rows, adapting the
/// inter-batch delay to a rolling count of caller-defined "failures".
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    /// Build a scheduler with the given sizing configuration.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Run `process` over every item in `items`, respecting the bounded
    /// concurrency plan, adaptive throttle, and cooperative cancellation.
    ///
    /// `is_failure` classifies a completed result as a throttle-worthy
    /// failure (e.g. a fallback-tier `PricingResult`). `on_progress` is
    /// called once per completed item, in completion order. Cancellation
    /// stops dequeuing further batches; items already dispatched run to
    /// completion and are kept in the returned vector — no partial result
    /// is ever discarded.
    pub async fn run<T, R, F, Fut>(
        &self,
        items: Vec<T>,
        process: F,
        is_failure: impl Fn(&R) -> bool,
        mut on_progress: impl FnMut(Progress),
        cancel: CancellationToken,
    ) -> Vec<R>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = R>,
    {
        let total = items.len();
        let (batch_size, concurrency) = batch_plan(total, &self.config);
        let start = Instant::now();

        let mut results = Vec::with_capacity(total);
        let mut processed = 0usize;
        let mut current_delay = Duration::from_millis(self.config.min_batch_delay_ms);
        let min_delay = Duration::from_millis(self.config.min_batch_delay_ms);
        let max_delay = Duration::from_millis(self.config.max_batch_delay_ms);

        let mut chunks: Vec<Vec<T>> = Vec::new();
        let mut remaining = items;
        while !remaining.is_empty() {
            let take = batch_size.min(remaining.len());
            chunks.push(remaining.drain(..take).collect());
        }

        for (batch_index, chunk) in chunks.into_iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }

            let mut stream = stream::iter(chunk.into_iter().map(&process))
                .buffer_unordered(concurrency.max(1));

            let mut batch_failed = false;
            while let Some(result) = stream.next().await {
                if is_failure(&result) {
                    batch_failed = true;
                }
                processed += 1;
                on_progress(Progress { processed, total, elapsed: start.elapsed() });
                results.push(result);
            }

            if batch_failed {
                current_delay = std::cmp::min(current_delay.mul_f64(1.5), max_delay);
            } else {
                current_delay = std::cmp::max(
                    Duration::from_millis((current_delay.as_millis() as f64 * 0.8) as u64),
                    min_delay,
                );
            }

            let has_more_batches = batch_index + 1 < (total.div_ceil(batch_size.max(1)));
            if has_more_batches && !cancel.is_cancelled() {
                tokio::time::sleep(current_delay).await;
            }
        }

        results
    }
}
