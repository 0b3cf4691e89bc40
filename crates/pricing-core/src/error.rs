//! Error types for pricing-core.
//!
//! Per the pipeline's never-fail contract (design §7), this `Error` type is
//! only ever surfaced for whole-job setup problems (bad config, missing
//! credentials, cancellation). No per-row failure ever produces one — a row
//! that hits an unrecoverable error is converted to a conservative
//! `PricingResult` instead, inside the pipeline.

use thiserror::Error;

/// Whole-job error type. Never raised per-row.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration failed to load or was missing a required field.
    #[error("config error: {0}")]
    Config(String),

    /// No credentials were configured for a required provider.
    #[error("missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// The job was cancelled before completion.
    #[error("job cancelled")]
    Cancelled,

    /// An LLM-layer error, wrapped one level.
    #[error("llm error: {0}")]
    Llm(#[from] pricing_llm::Error),

    /// A search-layer error, wrapped one level.
    #[error("search error: {0}")]
    Search(#[from] pricing_search::Error),

    /// A cache-layer error, wrapped one level.
    #[error("cache error: {0}")]
    Cache(#[from] pricing_cache::Error),

    /// Config deserialization error from the `config` crate.
    #[error("config deserialization error: {0}")]
    ConfigLoad(#[from] config::ConfigError),
}

/// Convenience Result type.
pub type Result<T> = std::result::Result<T, Error>;
