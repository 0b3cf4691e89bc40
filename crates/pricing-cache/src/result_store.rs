//! Per-job result storage.
//!
//! A job submits a batch of rows to the pricing pipeline and later asks for
//! its results by job ID. There's no query language — a job is a single
//! keyed lookup — so this is a thin retention-windowed map, not a database.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default retention window for a completed job's results.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(3600);

struct StoredJob<T> {
    results: Vec<T>,
    stored_at: Instant,
}

/// Stores the results of a completed pricing job, keyed by job ID, for a
/// bounded retention window.
pub struct ResultStore<T> {
    retention: Duration,
    jobs: Arc<RwLock<HashMap<String, StoredJob<T>>>>,
}

impl<T> Clone for ResultStore<T> {
    fn clone(&self) -> Self {
        Self { retention: self.retention, jobs: Arc::clone(&self.jobs) }
    }
}

impl<T> ResultStore<T>
where
    T: Clone,
{
    /// Create a store with the default one-hour retention window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    /// Create a store with a custom retention window.
    #[must_use]
    pub fn with_retention(retention: Duration) -> Self {
        Self { retention, jobs: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Store `results` under `job_id`, replacing any prior entry.
    pub async fn put(&self, job_id: impl Into<String>, results: Vec<T>) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(job_id.into(), StoredJob { results, stored_at: Instant::now() });
    }

    /// Retrieve the results for `job_id`, if present and not past retention.
    ///
    /// A retention-expired entry is evicted and reported as `NotFound`.
    pub async fn get(&self, job_id: &str) -> Result<Vec<T>> {
        let mut jobs = self.jobs.write().await;
        match jobs.get(job_id) {
            Some(job) if job.stored_at.elapsed() < self.retention => Ok(job.results.clone()),
            Some(_) => {
                jobs.remove(job_id);
                Err(Error::NotFound(job_id.to_string()))
            }
            None => Err(Error::NotFound(job_id.to_string())),
        }
    }
}

impl<T> Default for ResultStore<T>
where
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store: ResultStore<i32> = ResultStore::new();
        store.put("job-1", vec![1, 2, 3]).await;
        assert_eq!(store.get("job-1").await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn get_unknown_job_is_not_found() {
        let store: ResultStore<i32> = ResultStore::new();
        assert!(matches!(store.get("missing").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn expired_entry_is_evicted_and_not_found() {
        let store: ResultStore<i32> = ResultStore::with_retention(Duration::from_millis(10));
        store.put("job-1", vec![1]).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(matches!(store.get("job-1").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn put_replaces_prior_entry() {
        let store: ResultStore<i32> = ResultStore::new();
        store.put("job-1", vec![1]).await;
        store.put("job-1", vec![2, 3]).await;
        assert_eq!(store.get("job-1").await.unwrap(), vec![2, 3]);
    }
}
