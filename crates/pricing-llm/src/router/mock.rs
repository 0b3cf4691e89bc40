//! Mock LLM Provider for testing

use super::provider::LlmProvider;
use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::Result;
use std::sync::Mutex;

/// A mock LLM provider that returns a configurable fixed response. Useful
/// for deterministic tests of callers (`DescriptionEnhancer`,
/// `PriceEstimator`, the LLM categorization tier) without network access.
pub struct MockProvider {
    response: Mutex<String>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("mock response")
    }
}

impl MockProvider {
    /// Create a mock provider that always returns `response`.
    #[must_use]
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: Mutex::new(response.into()) }
    }

    /// Replace the fixed response returned by subsequent calls.
    pub fn set_response(&self, response: impl Into<String>) {
        *self.response.lock().expect("mock provider mutex poisoned") = response.into();
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn available_models(&self) -> Vec<String> {
        vec!["mock-model".to_string()]
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
        let content = self.response.lock().expect("mock provider mutex poisoned").clone();
        Ok(CompletionResponse {
            content,
            usage: None,
            finish_reason: Some("stop".to_string()),
            model: "mock-model".to_string(),
        })
    }
}
