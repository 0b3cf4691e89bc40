//! Error types for pricing-cache.

/// Errors that can occur in cache or result-store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serialization / deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The requested job ID has no stored results.
    #[error("no results stored for job {0}")]
    NotFound(String),
}

/// Convenience Result type.
pub type Result<T> = std::result::Result<T, Error>;
