//! Error types for pricing-search

use thiserror::Error;

/// Error type for search, trust, and URL-resolution operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A search provider exhausted its retry budget, or reported an outage
    /// condition (5xx, 429, timeout, connect failure) that may clear up.
    #[error("provider down: {0}")]
    ProviderDown(String),

    /// The provider rejected the request outright (4xx other than 429) —
    /// retrying with the same query cannot succeed.
    #[error("provider rejected request ({0}): {1}")]
    ProviderRejected(u16, String),

    /// The provider returned a response that could not be parsed.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// A network/transport failure below the retry layer.
    #[error("transport error: {0}")]
    Transport(String),

    /// Following redirects did not converge inside the allotted hops/time.
    #[error("resolution failed: {0}")]
    ResolutionFailed(String),

    /// HTTP client error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for pricing-search operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether retrying the operation that produced this error could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::ProviderDown(_) => true,
            Error::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status()
                        .map(|s| s.as_u16() >= 500 || s.as_u16() == 429)
                        .unwrap_or(true)
            }
            Error::MalformedResponse(_)
            | Error::ResolutionFailed(_)
            | Error::Serialization(_)
            | Error::ProviderRejected(_, _) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_down_and_transport_are_retryable() {
        assert!(Error::ProviderDown("serpapi HTTP 503".to_string()).is_retryable());
        assert!(Error::Transport("connection reset".to_string()).is_retryable());
    }

    #[test]
    fn provider_rejected_is_fatal() {
        assert!(!Error::ProviderRejected(400, "serpapi HTTP 400".to_string()).is_retryable());
        assert!(!Error::ProviderRejected(404, "serpapi HTTP 404".to_string()).is_retryable());
    }
}
