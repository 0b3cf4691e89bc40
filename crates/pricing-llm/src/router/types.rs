//! Core types for LLM routing
//!
//! This module contains `TaskType` and `ModelTier` for intelligent model
//! selection across the pricing pipeline's three LLM-backed tasks.

use crate::token::TokenBudget;
use serde::{Deserialize, Serialize};

/// Task type for intelligent model routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Rewriting a short description into a retail-searchable query.
    DescriptionEnhancement,
    /// Estimating a numeric replacement price for an item.
    PriceEstimation,
    /// Assigning a depreciation category to an item.
    Categorization,
}

impl TaskType {
    /// Get the recommended model tier for this task type.
    ///
    /// Enhancement and categorization are short, well-constrained outputs
    /// and run cheaply; price estimation benefits from a better-reasoning
    /// tier since a bad numeric guess is costlier to insurance outcomes.
    #[must_use]
    pub fn recommended_tier(&self) -> ModelTier {
        match self {
            Self::DescriptionEnhancement => ModelTier::Fast,
            Self::Categorization => ModelTier::Fast,
            Self::PriceEstimation => ModelTier::Standard,
        }
    }

    /// Get the default token budget for this task type.
    #[must_use]
    pub fn default_token_budget(&self) -> TokenBudget {
        match self {
            Self::DescriptionEnhancement => TokenBudget::new(64, 0.3),
            Self::Categorization => TokenBudget::new(32, 0.1),
            Self::PriceEstimation => TokenBudget::new(256, 0.2),
        }
    }
}

/// Model tier for cost/performance optimization, ordered by cost (ascending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Cheapest models for trivial, well-constrained outputs.
    Fast,
    /// Balanced models for general tasks.
    Standard,
    /// Premium models for complex reasoning.
    Premium,
}

impl ModelTier {
    /// Default model for each supported provider at this tier.
    #[must_use]
    pub fn default_model(&self, provider: &str) -> &'static str {
        match (self, provider) {
            (ModelTier::Fast, "anthropic") => "claude-haiku-4-5-20251001",
            (ModelTier::Standard, "anthropic") => "claude-sonnet-4-5-20250929",
            (ModelTier::Premium, "anthropic") => "claude-opus-4-5-20250514",
            _ => "claude-sonnet-4-5-20250929",
        }
    }

    /// Estimated cost multiplier relative to the Fast tier.
    #[must_use]
    pub fn cost_multiplier(&self) -> f32 {
        match self {
            ModelTier::Fast => 1.0,
            ModelTier::Standard => 6.0,
            ModelTier::Premium => 30.0,
        }
    }

    /// Constrain this tier to not exceed the given maximum tier.
    #[must_use]
    pub fn constrain_to(&self, max_tier: &ModelTier) -> ModelTier {
        if self.level() <= max_tier.level() {
            *self
        } else {
            *max_tier
        }
    }

    fn level(&self) -> u8 {
        match self {
            ModelTier::Fast => 0,
            ModelTier::Standard => 1,
            ModelTier::Premium => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_estimation_gets_a_higher_tier_than_enhancement() {
        assert!(TaskType::PriceEstimation.recommended_tier().level() > TaskType::DescriptionEnhancement.recommended_tier().level());
    }

    #[test]
    fn constrain_to_downgrades_when_over_max() {
        let constrained = ModelTier::Premium.constrain_to(&ModelTier::Fast);
        assert_eq!(constrained, ModelTier::Fast);
    }

    #[test]
    fn constrain_to_is_noop_when_within_max() {
        let constrained = ModelTier::Fast.constrain_to(&ModelTier::Premium);
        assert_eq!(constrained, ModelTier::Fast);
    }
}
