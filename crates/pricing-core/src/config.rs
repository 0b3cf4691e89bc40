//! Layered configuration for the pricing engine (defaults -> optional TOML
//! file -> `PRICING_`-prefixed environment variables), mirroring the
//! teacher's root-binary config loading (`config` + `dotenvy`).

use crate::error::{Error, Result};
use pricing_search::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default tolerance band, in percent (spec §6.3).
pub const DEFAULT_TOLERANCE_PCT: f64 = 50.0;
/// Widened tolerance band used by the `ToleranceFallback` stage.
pub const DEFAULT_FALLBACK_TOLERANCE_PCT: f64 = 100.0;
/// Default fallback price when the estimator can produce no number at all.
pub const DEFAULT_ESTIMATE_PRICE: f64 = pricing_llm::price_estimator::DEFAULT_ESTIMATE_PRICE;

/// Credentials/endpoint for a single external provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    /// Opaque API key/token.
    pub api_key: String,
    /// Base URL override, if the provider isn't hit at its default endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Category table entry: a depreciation class and its annual rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Category display name, matched exactly by the categorizer.
    pub name: String,
    /// Annual depreciation rate, as a decimal (`0.10` = 10%).
    pub dep_rate: f64,
    /// Keywords that trigger a tier-1 hit on this category.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Worker pool / batching / per-provider concurrency sizing (spec §4.10, §5).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Hard ceiling on concurrent row workers, regardless of item count.
    pub max_concurrency: usize,
    /// Per-provider concurrency cap (search and LLM calls share this budget).
    pub provider_concurrency: usize,
    /// Minimum inter-batch delay the adaptive throttle can relax down to.
    pub min_batch_delay_ms: u64,
    /// Maximum inter-batch delay the adaptive throttle can escalate up to.
    pub max_batch_delay_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 15,
            provider_concurrency: 8,
            min_batch_delay_ms: 100,
            max_batch_delay_ms: 2000,
        }
    }
}

/// Retry/backoff policy, deserialized from the spec's flat
/// `{max_attempts, base_ms, max_ms, jitter_ms}` shape and converted into a
/// [`pricing_search::RetryPolicy`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts, including the first.
    pub max_attempts: u32,
    /// Base delay in milliseconds before the first retry.
    pub base_ms: u64,
    /// Ceiling on any single delay, in milliseconds.
    pub max_ms: u64,
    /// Maximum jitter added to each delay, in milliseconds.
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, base_ms: 250, max_ms: 5000, jitter_ms: 100 }
    }
}

impl RetryConfig {
    /// Convert to the policy type `pricing-search` actually drives retries with.
    #[must_use]
    pub fn to_policy(self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.base_ms),
            max_delay: Duration::from_millis(self.max_ms),
            jitter: Duration::from_millis(self.jitter_ms),
            ..RetryPolicy::default()
        }
    }
}

/// Cache TTL/capacity, shared by the description/category cache and the
/// query/offer cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CacheSizing {
    /// Entry time-to-live in seconds.
    pub ttl_secs: u64,
    /// Maximum entries before oldest-insertion eviction.
    pub capacity: usize,
}

impl Default for CacheSizing {
    fn default() -> Self {
        Self { ttl_secs: 300, capacity: 1000 }
    }
}

impl CacheSizing {
    /// Convert to the cache crate's config type.
    #[must_use]
    pub fn to_cache_config(self) -> pricing_cache::CacheConfig {
        pricing_cache::CacheConfig {
            ttl: Duration::from_secs(self.ttl_secs),
            capacity: self.capacity,
        }
    }
}

/// Trust policy configuration: domain/pattern sets injected by the host
/// rather than hard-coded (design note: "URL policy is data, not code").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Trusted retailer hostnames.
    #[serde(default)]
    pub trusted_domains: Vec<String>,
    /// Marketplace/reseller substring patterns.
    #[serde(default)]
    pub untrusted_patterns: Vec<String>,
    /// Blocked URL-shape substrings (search pages, social media, error pages).
    #[serde(default)]
    pub blocked_patterns: Vec<String>,
}

impl TrustConfig {
    /// Build a [`pricing_search::TrustPolicy`] from this configuration. An
    /// empty config falls back to the compiled-in default retailer set
    /// (spec §3's "supplemented features": a default list has to exist
    /// somewhere since product management defers the canonical one).
    #[must_use]
    pub fn to_policy(&self) -> pricing_search::TrustPolicy {
        if self.trusted_domains.is_empty() && self.untrusted_patterns.is_empty() {
            return pricing_search::TrustPolicy::with_defaults();
        }
        let mut policy = pricing_search::TrustPolicy::new();
        for d in &self.trusted_domains {
            policy = policy.with_trusted_domain(d.clone());
        }
        for p in &self.untrusted_patterns {
            policy = policy.with_untrusted_pattern(p.clone());
        }
        for p in &self.blocked_patterns {
            policy = policy.with_blocked_pattern(p.clone());
        }
        policy
    }
}

/// The full configuration envelope the core requires from its host (spec §6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// LLM provider credentials/endpoint.
    pub llm: ProviderEndpoint,
    /// Search provider credentials/endpoint.
    pub search: ProviderEndpoint,
    /// Tolerance band, in percent.
    #[serde(default = "default_tolerance_pct")]
    pub tolerance_pct: f64,
    /// Widened tolerance band for `ToleranceFallback`.
    #[serde(default = "default_fallback_tolerance_pct")]
    pub fallback_tolerance_pct: f64,
    /// Trust policy domain/pattern sets.
    #[serde(default)]
    pub trust: TrustConfig,
    /// Depreciation category table. An empty table falls back to the
    /// compiled-in default (see [`crate::categorizer::default_categories`]).
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
    /// Scheduler sizing.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Cache sizing.
    #[serde(default)]
    pub cache: CacheSizing,
    /// Retry/backoff policy.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Default price used when the estimator produces no usable number.
    #[serde(default = "default_estimate_price")]
    pub default_estimate_price: f64,
}

fn default_tolerance_pct() -> f64 {
    DEFAULT_TOLERANCE_PCT
}

fn default_fallback_tolerance_pct() -> f64 {
    DEFAULT_FALLBACK_TOLERANCE_PCT
}

fn default_estimate_price() -> f64 {
    DEFAULT_ESTIMATE_PRICE
}

impl PricingConfig {
    /// Load configuration layered as defaults -> optional TOML file ->
    /// `PRICING_`-prefixed environment variables. Reads a `.env` file into
    /// the process environment first, if present, via `dotenvy`.
    pub fn load(file_path: Option<&str>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder()
            .set_default("tolerance_pct", DEFAULT_TOLERANCE_PCT)?
            .set_default("fallback_tolerance_pct", DEFAULT_FALLBACK_TOLERANCE_PCT)?
            .set_default("default_estimate_price", DEFAULT_ESTIMATE_PRICE)?
            .set_default("llm.api_key", "")?
            .set_default("search.api_key", "")?;

        if let Some(path) = file_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PRICING").separator("__").try_parsing(true),
        );

        let config = builder.build()?;
        let parsed: PricingConfig = config.try_deserialize()?;

        if parsed.llm.api_key.is_empty() {
            return Err(Error::MissingCredentials("llm".to_string()));
        }
        if parsed.search.api_key.is_empty() {
            return Err(Error::MissingCredentials("search".to_string()));
        }

        Ok(parsed)
    }
}
