//! LLM-backed depreciation categorization (tier 2 of the categorizer).

use crate::message::Message;
use crate::router::{LlmRouter, TaskType};
use tracing::warn;

const SYSTEM_PROMPT_SINGLE: &str = "You assign a depreciation category to a household item for an \
insurance claim. You will be given a fixed list of valid category names. Reply with exactly one \
category name from the list, and nothing else.";

const SYSTEM_PROMPT_BATCH: &str = "You assign a depreciation category to each of several household \
items for an insurance claim. You will be given a fixed list of valid category names, followed by \
a numbered list of items. Reply with one category name per line, in the same order as the items, \
and nothing else.";

/// Single-shot and batch LLM classification against a fixed category set.
pub struct CategorizerLlm<'a> {
    router: &'a LlmRouter,
    categories: &'a [String],
}

impl<'a> CategorizerLlm<'a> {
    /// Wrap a router and the fixed set of valid category names.
    #[must_use]
    pub fn new(router: &'a LlmRouter, categories: &'a [String]) -> Self {
        Self { router, categories }
    }

    /// Classify a single item description, returning a category name from
    /// `categories` (repaired via fuzzy match if the LLM's answer is a
    /// near-miss), or `None` if no response could be mapped.
    pub async fn classify_one(&self, description: &str) -> Option<String> {
        let prompt = format!("Categories:\n{}\n\nItem: {description}", self.categories.join("\n"));
        let messages = vec![Message::system(SYSTEM_PROMPT_SINGLE), Message::user(prompt)];

        match self.router.complete_for_task(TaskType::Categorization, messages).await {
            Ok(response) => self.repair(response.content.trim()),
            Err(err) => {
                warn!(error = %err, "llm categorization failed");
                None
            }
        }
    }

    /// Classify `descriptions` in one LLM call, index-aligned to the input.
    ///
    /// Each output element is `None` when the model's line for that index
    /// didn't map to any known category (including when the response has
    /// fewer lines than inputs).
    pub async fn classify_batch(&self, descriptions: &[String]) -> Vec<Option<String>> {
        if descriptions.is_empty() {
            return Vec::new();
        }

        let items = descriptions
            .iter()
            .enumerate()
            .map(|(i, d)| format!("{}. {d}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!("Categories:\n{}\n\nItems:\n{items}", self.categories.join("\n"));
        let messages = vec![Message::system(SYSTEM_PROMPT_BATCH), Message::user(prompt)];

        let response = match self.router.complete_for_task(TaskType::Categorization, messages).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "batch llm categorization failed");
                return vec![None; descriptions.len()];
            }
        };

        let lines: Vec<&str> = response.content.lines().filter(|l| !l.trim().is_empty()).collect();
        (0..descriptions.len())
            .map(|i| lines.get(i).and_then(|line| self.repair(strip_line_prefix(line))))
            .collect()
    }

    /// Map a raw LLM answer onto a known category: exact (case-insensitive)
    /// match first, then containment in either direction.
    fn repair(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Some(exact) = self.categories.iter().find(|c| c.eq_ignore_ascii_case(raw)) {
            return Some(exact.clone());
        }

        let raw_lower = raw.to_lowercase();
        self.categories
            .iter()
            .find(|c| {
                let c_lower = c.to_lowercase();
                c_lower.contains(&raw_lower) || raw_lower.contains(&c_lower)
            })
            .cloned()
    }
}

fn strip_line_prefix(line: &str) -> &str {
    let trimmed = line.trim();
    trimmed
        .split_once(['.', ')'])
        .map(|(prefix, rest)| if prefix.trim().chars().all(|c| c.is_ascii_digit()) { rest.trim() } else { trimmed })
        .unwrap_or(trimmed)
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

    fn categories() -> Vec<String> {
        vec!["ELC - ELECTRONICS B".to_string(), "FUR - FURNITURE A".to_string()]
    }

    #[tokio::test]
    async fn classify_one_returns_exact_match() {
        let router = router_with_response("ELC - ELECTRONICS B");
        let cats = categories();
        let categorizer = CategorizerLlm::new(&router, &cats);
        assert_eq!(categorizer.classify_one("4k television").await, Some("ELC - ELECTRONICS B".to_string()));
    }

    #[tokio::test]
    async fn classify_one_fuzzy_repairs_near_miss() {
        let router = router_with_response("ELECTRONICS");
        let cats = categories();
        let categorizer = CategorizerLlm::new(&router, &cats);
        assert_eq!(categorizer.classify_one("laptop").await, Some("ELC - ELECTRONICS B".to_string()));
    }

    #[tokio::test]
    async fn classify_one_returns_none_for_unmappable_answer() {
        let router = router_with_response("completely unrelated answer");
        let cats = categories();
        let categorizer = CategorizerLlm::new(&router, &cats);
        assert_eq!(categorizer.classify_one("mystery item").await, None);
    }

    #[tokio::test]
    async fn classify_batch_is_index_aligned() {
        let router = router_with_response("1. ELC - ELECTRONICS B\n2. FUR - FURNITURE A");
        let cats = categories();
        let categorizer = CategorizerLlm::new(&router, &cats);
        let result =
            categorizer.classify_batch(&["television".to_string(), "sofa".to_string()]).await;
        assert_eq!(result, vec![Some("ELC - ELECTRONICS B".to_string()), Some("FUR - FURNITURE A".to_string())]);
    }

    #[tokio::test]
    async fn classify_batch_pads_missing_lines_with_none() {
        let router = router_with_response("1. ELC - ELECTRONICS B");
        let cats = categories();
        let categorizer = CategorizerLlm::new(&router, &cats);
        let result =
            categorizer.classify_batch(&["television".to_string(), "sofa".to_string()]).await;
        assert_eq!(result, vec![Some("ELC - ELECTRONICS B".to_string()), None]);
    }
}
