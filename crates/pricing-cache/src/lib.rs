//! Pricing Cache — in-memory caching for the pricing pipeline
//!
//! Two pieces, sharing the crate but not an interface:
//! - [`Cache`]: a generic TTL + capacity-bounded cache consulted at each
//!   LLM/search boundary (query results, description enhancements, price
//!   estimates, categorizations) so repeated runs don't re-hit providers.
//! - [`ResultStore`]: per-job result storage so a host can submit a batch
//!   and retrieve its results later by job ID.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod result_store;

pub use cache::{normalize_key, Cache, CacheConfig, CacheStats};
pub use error::{Error, Result};
pub use result_store::{ResultStore, DEFAULT_RETENTION};
