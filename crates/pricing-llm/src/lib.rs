//! Pricing LLM - LLM provider abstraction for the pricing engine
//!
//! This crate provides the LLM integration used by the three LLM-backed
//! stages of the pricing pipeline:
//! - Description enhancement: rewriting a short item description into a
//!   retail-searchable query
//! - Price estimation: the last-resort numeric replacement-cost guess when
//!   no search result can be trusted
//! - Categorization: assigning a depreciation category when keyword
//!   matching is inconclusive
//!
//! Anthropic Claude is the only concrete provider backend; `MockProvider`
//! exists for deterministic tests of the callers above.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// LLM API providers
pub mod providers;

/// Assigning a depreciation category via LLM when keyword matching is inconclusive.
pub mod categorizer_llm;
/// Rewriting a short item description into a retail-searchable query via LLM.
pub mod description_enhancer;
pub mod completion;
pub mod error;
/// JSON extraction helpers for parsing structured data out of free-form LLM text.
pub mod json_extract;
pub mod message;
/// Estimating a numeric replacement price via LLM when search yields nothing usable.
pub mod price_estimator;
pub mod router;
pub mod token;
mod util;

pub use providers::anthropic;

pub use categorizer_llm::CategorizerLlm;
pub use description_enhancer::DescriptionEnhancer;
pub use error::{Error, Result};
pub use price_estimator::PriceEstimator;
pub use router::{
    count_message_tokens, count_tokens, CompletionRequest, CompletionResponse, LlmProvider,
    LlmRouter, Message, MessageRole, MockProvider, ModelConfig, ModelRoutingConfig, ModelTier,
    ProviderConfig, RouterConfig, RoutingRules, TaskType, TokenBudget, TokenCounter, TokenUsage,
    TOKEN_COUNTER,
};

// Re-export the provider type
pub use anthropic::{AnthropicConfig, AnthropicProvider};
