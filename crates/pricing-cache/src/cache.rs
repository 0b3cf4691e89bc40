//! Generic TTL + capacity-bounded cache.
//!
//! Used at each LLM/search boundary in the pricing pipeline (query results,
//! description enhancements, price estimates, categorizations) so repeated
//! runs over the same rows don't re-hit external providers.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Collapse whitespace and case so equivalent queries share a cache key.
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Cache sizing and expiry configuration.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Entry time-to-live.
    pub ttl: Duration,
    /// Maximum number of entries before oldest-insertion eviction kicks in.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl: Duration::from_secs(300), capacity: 1000 }
    }
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of successful lookups.
    pub hits: u64,
    /// Number of lookups that missed (absent or expired).
    pub misses: u64,
    /// Current entry count.
    pub size: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, in `[0.0, 1.0]`. `0.0` with no lookups yet.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    insertion_order: VecDeque<K>,
    hits: u64,
    misses: u64,
}

/// A TTL + FIFO-capacity-bounded cache shared across concurrent workers.
///
/// Cloning shares the underlying store (`Arc`-backed), matching the pattern
/// used by [`crate`]'s sibling rate limiters: cheap to clone, safe to share
/// across tasks.
pub struct Cache<K, V> {
    config: CacheConfig,
    inner: Arc<RwLock<Inner<K, V>>>,
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self { config: self.config, inner: Arc::clone(&self.inner) }
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache with the default TTL (300s) and capacity (1000).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a cache with custom TTL/capacity.
    #[must_use]
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Arc::new(RwLock::new(Inner {
                entries: HashMap::new(),
                insertion_order: VecDeque::new(),
                hits: 0,
                misses: 0,
            })),
        }
    }

    /// Look up `key`. A stale (TTL-expired) entry counts as a miss and is evicted.
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.write().await;
        let is_fresh = inner.entries.get(key).is_some_and(|e| e.inserted_at.elapsed() < self.config.ttl);

        if is_fresh {
            inner.hits += 1;
            return inner.entries.get(key).map(|e| e.value.clone());
        }

        inner.misses += 1;
        inner.entries.remove(key);
        None
    }

    /// Insert or replace `key`, evicting the oldest entry if over capacity.
    pub async fn set(&self, key: K, value: V) {
        let mut inner = self.inner.write().await;

        if !inner.entries.contains_key(&key) {
            inner.insertion_order.push_back(key.clone());
        }
        inner.entries.insert(key, Entry { value, inserted_at: Instant::now() });

        while inner.entries.len() > self.config.capacity {
            if let Some(oldest) = inner.insertion_order.pop_front() {
                inner.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    /// Explicitly remove an entry, if present.
    pub async fn evict(&self, key: &K) {
        let mut inner = self.inner.write().await;
        inner.entries.remove(key);
        inner.insertion_order.retain(|k| k != key);
    }

    /// Current hit/miss/size statistics.
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.read().await;
        CacheStats { hits: inner.hits, misses: inner.misses, size: inner.entries.len() }
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key_collapses_whitespace_and_case() {
        assert_eq!(normalize_key("  Bissell   Vacuum  "), "bissell vacuum");
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache: Cache<String, u32> = Cache::new();
        cache.set("a".to_string(), 1).await;
        assert_eq!(cache.get(&"a".to_string()).await, Some(1));
    }

    #[tokio::test]
    async fn miss_on_absent_key_is_counted() {
        let cache: Cache<String, u32> = Cache::new();
        assert_eq!(cache.get(&"missing".to_string()).await, None);
        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[tokio::test]
    async fn expired_entry_counts_as_miss_and_is_evicted() {
        let cache: Cache<String, u32> =
            Cache::with_config(CacheConfig { ttl: Duration::from_millis(10), capacity: 1000 });
        cache.set("a".to_string(), 1).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get(&"a".to_string()).await, None);
        assert_eq!(cache.stats().await.size, 0);
    }

    #[tokio::test]
    async fn over_capacity_evicts_oldest_insertion() {
        let cache: Cache<u32, u32> =
            Cache::with_config(CacheConfig { ttl: Duration::from_secs(300), capacity: 2 });
        cache.set(1, 1).await;
        cache.set(2, 2).await;
        cache.set(3, 3).await;

        assert_eq!(cache.get(&1).await, None);
        assert_eq!(cache.get(&2).await, Some(2));
        assert_eq!(cache.get(&3).await, Some(3));
    }

    #[tokio::test]
    async fn hit_rate_reflects_hits_and_misses() {
        let cache: Cache<String, u32> = Cache::new();
        cache.set("a".to_string(), 1).await;
        cache.get(&"a".to_string()).await;
        cache.get(&"missing".to_string()).await;

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[tokio::test]
    async fn clone_shares_underlying_store() {
        let cache: Cache<String, u32> = Cache::new();
        let clone = cache.clone();
        cache.set("a".to_string(), 1).await;
        assert_eq!(clone.get(&"a".to_string()).await, Some(1));
    }
}
