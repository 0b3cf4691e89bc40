//! Estimating a numeric replacement price when an item has no purchase price.

use crate::json_extract::{extract_first_number, extract_json_object};
use crate::message::Message;
use crate::router::{LlmRouter, TaskType};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default replacement price used when the LLM estimate can't be parsed at all.
pub const DEFAULT_ESTIMATE_PRICE: f64 = 50.0;

const SYSTEM_PROMPT: &str = "You estimate the replacement cost (in US dollars) of household items \
for insurance claims. Reply with a single strict JSON object and nothing else, in the form \
{\"price\": <number>, \"confidence\": \"low\"|\"medium\"|\"high\", \"reasoning\": \"<one sentence>\"}.";

/// Confidence level attached to a price estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Low-confidence estimate (e.g. parse failed or the default was used).
    #[default]
    Low,
    /// Medium-confidence estimate.
    Medium,
    /// High-confidence estimate.
    High,
}

/// A replacement-cost estimate for an item missing a purchase price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceEstimate {
    /// Estimated replacement price in USD.
    pub price: f64,
    /// How confident the estimate is.
    pub confidence: Confidence,
    /// Short human-readable justification.
    pub reasoning: String,
    /// Where the estimate came from (`"LLM Estimate"` or `"Default Estimate"`).
    pub source: String,
}

/// Estimates a numeric replacement price for items with no usable purchase price.
pub struct PriceEstimator<'a> {
    router: &'a LlmRouter,
    default_price: f64,
}

impl<'a> PriceEstimator<'a> {
    /// Wrap a router for price estimation calls, using the built-in default price.
    #[must_use]
    pub fn new(router: &'a LlmRouter) -> Self {
        Self { router, default_price: DEFAULT_ESTIMATE_PRICE }
    }

    /// Wrap a router with a custom default price for total-parse-failure cases.
    #[must_use]
    pub fn with_default_price(router: &'a LlmRouter, default_price: f64) -> Self {
        Self { router, default_price }
    }

    /// Estimate a replacement price for `description` (with optional `brand`).
    ///
    /// Invoked only when `purchase_price` is null or non-positive. Always
    /// returns a usable estimate: strict JSON parsing first, then a
    /// free-text dollar-number fallback, then the configured default price.
    pub async fn estimate(&self, description: &str, brand: Option<&str>) -> PriceEstimate {
        let mut prompt = String::new();
        if let Some(brand) = brand.filter(|b| !b.is_empty() && *b != "No Brand") {
            prompt.push_str("Brand: ");
            prompt.push_str(brand);
            prompt.push('\n');
        }
        prompt.push_str("Item: ");
        prompt.push_str(description);

        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)];

        let response = match self.router.complete_for_task(TaskType::PriceEstimation, messages).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "price estimation call failed, using default estimate");
                return self.default_estimate();
            }
        };

        if let Some(value) = extract_json_object(&response.content) {
            if let Some(price) = value.get("price").and_then(serde_json::Value::as_f64) {
                let confidence = value
                    .get("confidence")
                    .and_then(serde_json::Value::as_str)
                    .and_then(parse_confidence)
                    .unwrap_or(Confidence::Medium);
                let reasoning = value
                    .get("reasoning")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("no reasoning provided")
                    .to_string();
                return PriceEstimate {
                    price,
                    confidence,
                    reasoning,
                    source: "LLM Estimate".to_string(),
                };
            }
        }

        if let Some(price) = extract_first_number(&response.content) {
            return PriceEstimate {
                price,
                confidence: Confidence::Low,
                reasoning: "extracted from free-form response".to_string(),
                source: "LLM Estimate".to_string(),
            };
        }

        warn!("price estimation response had no parseable number, using default estimate");
        self.default_estimate()
    }

    fn default_estimate(&self) -> PriceEstimate {
        PriceEstimate {
            price: self.default_price,
            confidence: Confidence::Low,
            reasoning: "no usable estimate produced".to_string(),
            source: "Default Estimate".to_string(),
        }
    }
}

fn parse_confidence(raw: &str) -> Option<Confidence> {
    match raw.to_lowercase().as_str() {
        "low" => Some(Confidence::Low),
        "medium" => Some(Confidence::Medium),
        "high" => Some(Confidence::High),
        _ => None,
    }
}
