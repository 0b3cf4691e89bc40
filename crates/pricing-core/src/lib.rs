//! Pricing Core - Replacement-Cost Pricing Pipeline
//!
//! This crate provides the core pricing logic for the replacement-cost
//! estimation engine, including:
//! - Model: the `Row` -> `PricingResult` data model
//! - Config: layered configuration for providers, trust, scheduling, caching
//! - Categorizer: tiered depreciation classification
//! - Scheduler: bounded-concurrency worker pool with adaptive throttling
//! - Pipeline: the per-row `PricingPipeline` state machine

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod categorizer;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod scheduler;

pub use categorizer::{default_categories, Categorizer};
pub use config::{
    CacheSizing, CategoryEntry, PricingConfig, ProviderEndpoint, RetryConfig, SchedulerConfig,
    TrustConfig,
};
pub use error::{Error, Result};
pub use model::{
    Categorization, CategorizationMethod, Facts, JobResults, LlmEstimate, MatchQuality,
    PricingResult, PricingTier, Row, Status, Trace,
};
pub use pipeline::{PipelineCaches, PricingPipeline};
pub use scheduler::{batch_plan, Progress, Scheduler};
