//! LLM Router implementation
//!
//! This module contains the main LlmRouter struct that manages multiple providers
//! and provides intelligent routing based on task types.

use super::provider::LlmProvider;
use super::rules::RoutingRules;
use super::types::TaskType;
use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// LLM Router for managing multiple providers with intelligent routing
pub struct LlmRouter {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    default_provider: String,
    routing_rules: RoutingRules,
}

impl LlmRouter {
    /// Create a new router
    #[must_use]
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
            routing_rules: RoutingRules::default(),
        }
    }

    /// Create a router with routing rules
    #[must_use]
    pub fn with_routing_rules(mut self, rules: RoutingRules) -> Self {
        self.routing_rules = rules;
        self
    }

    /// Set routing rules
    pub fn set_routing_rules(&mut self, rules: RoutingRules) {
        self.routing_rules = rules;
    }

    /// Get the routing rules
    #[must_use]
    pub fn routing_rules(&self) -> &RoutingRules {
        &self.routing_rules
    }

    /// Register a provider
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn LlmProvider>) {
        let name = name.into();
        debug!(provider = %name, "Registering LLM provider");
        self.providers.insert(name, provider);
    }

    /// Get a provider by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(name).cloned()
    }

    /// Get the default provider
    #[must_use]
    pub fn default_provider(&self) -> Option<Arc<dyn LlmProvider>> {
        self.get(&self.default_provider)
    }

    /// Get the default provider name
    #[must_use]
    pub fn default_provider_name(&self) -> &str {
        &self.default_provider
    }

    /// Set the default provider
    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default_provider = name.into();
    }

    /// List registered provider names
    #[must_use]
    pub fn list_providers(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a provider is registered
    #[must_use]
    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Complete using the default provider
    #[instrument(skip(self, request))]
    pub async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let provider = self
            .default_provider()
            .ok_or_else(|| Error::NotConfigured(self.default_provider.clone()))?;

        provider.complete(request).await
    }

    /// Complete using a specific provider
    #[instrument(skip(self, request))]
    pub async fn complete_with(
        &self,
        provider_name: &str,
        request: CompletionRequest,
    ) -> Result<CompletionResponse> {
        let provider = self
            .get(provider_name)
            .ok_or_else(|| Error::NotConfigured(provider_name.to_string()))?;

        provider.complete(request).await
    }

    // ========================================================================
    // Task-based Routing (Intelligent Model Selection)
    // ========================================================================

    /// Select the best provider and model for a task type
    #[must_use]
    pub fn select_for_task(&self, task_type: TaskType) -> Option<(Arc<dyn LlmProvider>, String)> {
        // Check for task-specific provider override
        if let Some(provider_name) = self.routing_rules.task_providers.get(&task_type) {
            if let Some(provider) = self.get(provider_name) {
                let model = self
                    .routing_rules
                    .task_models
                    .get(&task_type)
                    .cloned()
                    .unwrap_or_else(|| provider.default_model().to_string());
                return Some((provider, model));
            }
        }

        // Get recommended tier for task
        let mut tier = task_type.recommended_tier();

        // Apply max tier constraint (downgrade if necessary)
        if let Some(max_tier) = &self.routing_rules.max_tier {
            tier = tier.constrain_to(max_tier);
        }

        // Find best provider
        let provider = self.default_provider()?;
        let provider_name = self.default_provider_name();

        // Get model for tier
        let model = self
            .routing_rules
            .task_models
            .get(&task_type)
            .cloned()
            .unwrap_or_else(|| tier.default_model(provider_name).to_string());

        info!(
            task = ?task_type,
            provider = provider_name,
            model = %model,
            tier = ?tier,
            "Selected model for task"
        );

        Some((provider, model))
    }

    /// Complete a request with automatic model selection based on task type.
    ///
    /// Applies the task's default token budget (or a configured override)
    /// before dispatching to the selected provider.
    #[instrument(skip(self, messages))]
    pub async fn complete_for_task(
        &self,
        task_type: TaskType,
        messages: Vec<crate::message::Message>,
    ) -> Result<CompletionResponse> {
        let (provider, model) = self
            .select_for_task(task_type)
            .ok_or_else(|| Error::NotConfigured("No suitable provider found".to_string()))?;

        let budget = self.routing_rules.get_token_budget(task_type);

        info!(
            task = ?task_type,
            max_tokens = budget.max_tokens,
            temperature = budget.temperature,
            "Applying task-specific token budget"
        );

        let request = CompletionRequest {
            model,
            messages,
            max_tokens: Some(budget.max_tokens),
            temperature: Some(budget.temperature),
            stop: None,
        };

        provider.complete(request).await
    }

    /// Estimate cost for a task (relative units)
    #[must_use]
    pub fn estimate_cost(&self, task_type: TaskType, estimated_tokens: u32) -> f32 {
        let tier = task_type.recommended_tier();
        let multiplier = tier.cost_multiplier();
        (estimated_tokens as f32 / 1000.0) * multiplier
    }
}

// ============================================================================
// LlmProvider implementation for LlmRouter
// ============================================================================

#[async_trait::async_trait]
impl LlmProvider for LlmRouter {
    fn name(&self) -> &str {
        "router"
    }

    fn available_models(&self) -> Vec<String> {
        self.providers.values().flat_map(|p| p.available_models()).collect()
    }

    fn default_model(&self) -> &str {
        self.providers
            .get(&self.default_provider)
            .map(|p| p.default_model())
            .unwrap_or(&self.default_provider)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        LlmRouter::complete(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::MockProvider;
    use super::super::types::ModelTier;
    use super::*;

    fn router_with_mock() -> LlmRouter {
        let mut router = LlmRouter::new("mock");
        router.register("mock", Arc::new(MockProvider::default()));
        router
    }

    #[test]
    fn select_for_task_uses_recommended_tier() {
        let router = router_with_mock();
        let (provider, model) = router.select_for_task(TaskType::PriceEstimation).unwrap();
        assert_eq!(provider.name(), "mock");
        assert_eq!(model, ModelTier::Standard.default_model("mock"));
    }

    #[test]
    fn select_for_task_respects_provider_override() {
        let mut router = router_with_mock();
        router.register("secondary", Arc::new(MockProvider::new("secondary response")));
        let mut rules = RoutingRules::default();
        rules.task_providers.insert(TaskType::Categorization, "secondary".to_string());
        router.set_routing_rules(rules);

        let (provider, _) = router.select_for_task(TaskType::Categorization).unwrap();
        assert_eq!(provider.name(), "mock");
    }

    #[tokio::test]
    async fn complete_for_task_applies_token_budget() {
        let router = router_with_mock();
        let response = router
            .complete_for_task(TaskType::Categorization, vec![crate::message::Message::user("box of tools")])
            .await
            .unwrap();
        assert_eq!(response.content, "mock response");
    }

    #[tokio::test]
    async fn complete_without_default_provider_is_not_configured() {
        let router = LlmRouter::new("missing");
        let err = router.complete(CompletionRequest::new("any-model")).await.unwrap_err();
        assert!(matches!(err, Error::NotConfigured(_)));
    }
}
