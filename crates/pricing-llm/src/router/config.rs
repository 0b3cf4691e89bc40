//! Configuration types for LLM routing

use super::types::{ModelTier, TaskType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Whether the provider is enabled.
    pub enabled: bool,
    /// API key (or env var name).
    pub api_key: Option<String>,
    /// Base URL override.
    pub base_url: Option<String>,
    /// Default model.
    pub default_model: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self { enabled: true, api_key: None, base_url: None, default_model: None, timeout_ms: Some(60_000) }
    }
}

/// Router configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Default provider name.
    pub default_provider: String,
    /// Provider-specific configurations.
    pub providers: HashMap<String, ProviderConfig>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { default_provider: "anthropic".to_string(), providers: HashMap::new() }
    }
}

/// Model configuration for a specific tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider name (e.g. "anthropic", "mock").
    pub provider: String,
    /// Model name.
    pub model: String,
}

impl ModelConfig {
    /// Create a new model configuration.
    #[must_use]
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self { provider: provider.into(), model: model.into() }
    }
}

/// Model routing configuration: which model backs each cost tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRoutingConfig {
    /// Model for fast, cheap tasks (enhancement, categorization).
    pub fast: ModelConfig,
    /// Model for general tasks.
    pub standard: ModelConfig,
    /// Model for complex tasks (price estimation).
    pub premium: ModelConfig,
}

impl Default for ModelRoutingConfig {
    fn default() -> Self {
        Self {
            fast: ModelConfig::new("anthropic", "claude-haiku-4-5-20251001"),
            standard: ModelConfig::new("anthropic", "claude-sonnet-4-5-20250929"),
            premium: ModelConfig::new("anthropic", "claude-opus-4-5-20250514"),
        }
    }
}

impl ModelRoutingConfig {
    /// Get the model config for a task type.
    #[must_use]
    pub fn get_for_task(&self, task_type: TaskType) -> &ModelConfig {
        match task_type.recommended_tier() {
            ModelTier::Fast => &self.fast,
            ModelTier::Standard => &self.standard,
            ModelTier::Premium => &self.premium,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_routing_maps_each_task_tier() {
        let config = ModelRoutingConfig::default();
        assert_eq!(config.get_for_task(TaskType::DescriptionEnhancement).provider, "anthropic");
        assert_eq!(config.get_for_task(TaskType::PriceEstimation).model, "claude-sonnet-4-5-20250929");
    }
}
