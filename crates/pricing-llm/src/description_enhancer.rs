//! Rewriting a short item description into a retail-searchable query.

use crate::message::Message;
use crate::router::{LlmRouter, TaskType};
use tracing::warn;

const SYSTEM_PROMPT: &str = "You rewrite short insurance-claim item descriptions into concise, \
retail-searchable product queries. Reply with only the rewritten description — no preamble, no \
quotes, no explanation.";

/// Rewrites a short description into a query more likely to surface a direct
/// retail product match, using an LLM. Never fails the caller: any error or
/// empty output falls back to the original description.
pub struct DescriptionEnhancer<'a> {
    router: &'a LlmRouter,
}

impl<'a> DescriptionEnhancer<'a> {
    /// Wrap a router for description enhancement calls.
    #[must_use]
    pub fn new(router: &'a LlmRouter) -> Self {
        Self { router }
    }

    /// Enhance `description` given optional brand/model context.
    ///
    /// Duplicated brand tokens in the description (e.g. "bissell bissell
    /// vacuum") are collapsed before the prompt is built. On any LLM error
    /// or empty response, the original (de-duplicated) description is
    /// returned unchanged.
    pub async fn enhance(&self, description: &str, brand: Option<&str>, model: Option<&str>) -> String {
        let deduped = dedupe_tokens(description);

        let mut prompt = String::new();
        if let Some(brand) = brand.filter(|b| !b.is_empty() && *b != "No Brand") {
            prompt.push_str("Brand: ");
            prompt.push_str(brand);
            prompt.push('\n');
        }
        if let Some(model) = model.filter(|m| !m.is_empty()) {
            prompt.push_str("Model: ");
            prompt.push_str(model);
            prompt.push('\n');
        }
        prompt.push_str("Description: ");
        prompt.push_str(&deduped);

        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)];

        match self.router.complete_for_task(TaskType::DescriptionEnhancement, messages).await {
            Ok(response) => {
                let enhanced = response.content.trim().trim_matches('"').to_string();
                if enhanced.is_empty() {
                    deduped
                } else {
                    enhanced
                }
            }
            Err(err) => {
                warn!(error = %err, "description enhancement failed, using original description");
                deduped
            }
        }
    }
}

/// Collapse immediately-repeated whitespace-separated tokens, case-insensitively.
fn dedupe_tokens(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for token in text.split_whitespace() {
        if out.last().is_none_or(|prev| !prev.eq_ignore_ascii_case(token)) {
            out.push(token);
        }
    }
    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::MockProvider;
    use std::sync::Arc;

    fn router_with_response(response: &str) -> LlmRouter {
        let mut router = LlmRouter::new("mock");
        router.register("mock", Arc::new(MockProvider::new(response)));
        router
    }

    #[test]
    fn dedupe_collapses_repeated_brand_tokens() {
        assert_eq!(dedupe_tokens("bissell bissell vacuum"), "bissell vacuum");
        assert_eq!(dedupe_tokens("iron and ironing board"), "iron and ironing board");
    }

    #[tokio::test]
    async fn enhance_returns_llm_output_when_available() {
        let router = router_with_response("Bissell upright bagless vacuum");
        let enhancer = DescriptionEnhancer::new(&router);
        let result = enhancer.enhance("bissell bissell vacuum", Some("Bissell"), None).await;
        assert_eq!(result, "Bissell upright bagless vacuum");
    }

    #[tokio::test]
    async fn enhance_falls_back_to_original_on_empty_response() {
        let router = router_with_response("");
        let enhancer = DescriptionEnhancer::new(&router);
        let result = enhancer.enhance("bissell bissell vacuum", None, None).await;
        assert_eq!(result, "bissell vacuum");
    }

    #[tokio::test]
    async fn enhance_falls_back_to_original_on_provider_error() {
        let router = LlmRouter::new("missing");
        let enhancer = DescriptionEnhancer::new(&router);
        let result = enhancer.enhance("wood dining table", None, None).await;
        assert_eq!(result, "wood dining table");
    }
}
