//! The pricing core's data model: the types that flow between a `Row` coming
//! in and a `PricingResult` going out (spec §3).

use serde::{Deserialize, Serialize};

/// One line item from the inventory list, as handed to the core by the
/// (out-of-scope) file-parser collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    /// Stable index into the original workbook; carried through unchanged so
    /// downstream consumers can re-order by it.
    pub row_index: u64,
    /// Required; the pipeline treats an empty description as a hard input error.
    pub description: String,
    /// Coerced to at least 1 on construction.
    #[serde(default = "default_qty")]
    pub qty: u32,
    /// Nullable; missing or non-positive values trigger the price estimator.
    #[serde(default)]
    pub purchase_price: Option<f64>,
    /// `"No Brand"` is normalized to `None` on construction.
    #[serde(default)]
    pub brand: Option<String>,
    /// Model name/number, if any.
    #[serde(default)]
    pub model: Option<String>,
    /// Room the item was found in, if recorded.
    #[serde(default)]
    pub room: Option<String>,
    /// Item age in years, if recorded.
    #[serde(default)]
    pub age_years: Option<f64>,
    /// Condition description, if recorded.
    #[serde(default)]
    pub condition: Option<String>,
}

fn default_qty() -> u32 {
    1
}

impl Row {
    /// Normalize qty to at least 1 and `"No Brand"` to `None`, as the parser
    /// collaborator is expected to but the core re-asserts at its boundary.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.qty == 0 {
            self.qty = 1;
        }
        if self.brand.as_deref().is_some_and(|b| b.eq_ignore_ascii_case("no brand")) {
            self.brand = None;
        }
        self
    }
}

/// Facts derived once per row: the enhanced title plus whatever attributes
/// were extracted from it, feeding `QueryBuilder` and `OfferRanker`.
#[derive(Debug, Clone)]
pub struct Facts {
    /// Enhanced or raw item title.
    pub title: String,
    /// Brand, if any.
    pub brand: Option<String>,
    /// Model, if any.
    pub model: Option<String>,
    /// Broad category, if classified.
    pub category: String,
    /// Narrower subcategory, if classified.
    pub subcategory: String,
    /// Extracted descriptive attributes (not currently surfaced on the wire).
    pub attributes: Vec<String>,
    /// Keywords pulled from the title, used for tier-1 categorization.
    pub keywords: Vec<String>,
    /// Free-text condition, if recorded on the row.
    pub condition: Option<String>,
    /// Confidence in these facts, in `[0, 1]`; defaults to 0.8.
    pub confidence: f64,
}

impl Default for Facts {
    fn default() -> Self {
        Self {
            title: String::new(),
            brand: None,
            model: None,
            category: String::new(),
            subcategory: String::new(),
            attributes: Vec::new(),
            keywords: Vec::new(),
            condition: None,
            confidence: 0.8,
        }
    }
}

/// Confidence classification of a match or estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchQuality {
    /// QuickMatch short-circuit: a direct-product URL on a trusted retailer
    /// inside the tolerance band.
    Exact,
    /// EnrichedSearch/Resolve path produced a qualifying offer.
    Good,
    /// ToleranceFallback or MarketSearch accepted a best-effort candidate.
    Approximate,
    /// PurchasePriceFallback: no candidate offer at all.
    None,
}

impl MatchQuality {
    /// Human-readable label for the wire format's `match_quality` field.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            MatchQuality::Exact => "Exact",
            MatchQuality::Good => "Good",
            MatchQuality::Approximate => "Approximate",
            MatchQuality::None => "None",
        }
    }
}

/// Whether a result came from a live offer search or a fallback tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingTier {
    /// QuickMatch or EnrichedSearch produced a qualifying offer.
    Serp,
    /// ToleranceFallback, MarketSearch, or PurchasePriceFallback.
    Fallback,
}

impl PricingTier {
    /// Wire label, per spec §6.2 (`"SERP" | "FALLBACK"`).
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            PricingTier::Serp => "SERP",
            PricingTier::Fallback => "FALLBACK",
        }
    }
}

/// Whether a result anchors on a verified direct-product match or a
/// best-effort estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// URL is direct-product, source is trusted, price-URL consistent.
    Found,
    /// Any fallback tier; price is a best-effort estimate.
    Estimated,
}

impl Status {
    /// Wire label, per spec §6.2.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Status::Found => "Found",
            Status::Estimated => "Estimated",
        }
    }
}

/// The LLM price estimate attached to a result when the estimator ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmEstimate {
    /// Estimated price in USD.
    pub price: f64,
    /// Confidence label (`low`/`medium`/`high`).
    pub confidence: String,
    /// Free-text justification.
    pub reasoning: String,
    /// `"LLM Estimate"` or `"Default Estimate"`.
    pub source: String,
}

/// Per-row diagnostic trail: what was tried, what was skipped, and why.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    /// Every query text issued to the search provider, in issue order.
    pub queries: Vec<String>,
    /// Total candidate offers seen across all search calls.
    pub candidates_checked: u32,
    /// Offers skipped because their source was trusted but disqualified for
    /// another reason (price floor, blocked URL shape).
    pub trusted_skipped: Vec<String>,
    /// Offers skipped because their source was untrusted.
    pub untrusted_skipped: Vec<String>,
    /// Human-readable description of the validation path taken.
    pub validation: String,
}

/// The per-row output record (spec §6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingResult {
    /// Carried through from the input row.
    pub row_index: u64,
    /// Carried through from the input row (post-enhancement is not emitted
    /// on the wire; callers that want it can read `trace`).
    pub description: String,
    /// `"No Brand"` when the row had none.
    pub brand: String,
    /// `Found` or `Estimated`.
    pub status: Status,
    /// Retailer friendly name.
    pub source: String,
    /// Price in USD.
    pub price: f64,
    /// `round(price * qty, 2)`.
    pub total_replacement_price: f64,
    /// `round(purchase_price * qty, 2)`, when a purchase price was known.
    pub cost_to_replace: f64,
    /// Product URL, when one was found or constructed.
    pub url: Option<String>,
    /// Human-readable match quality label.
    pub match_quality: String,
    /// `"SERP"` or `"FALLBACK"`.
    pub pricing_tier: String,
    /// Resolved depreciation category, or empty string.
    pub dep_category: String,
    /// `"NN.NNNN%"`-formatted depreciation rate.
    pub dep_percent: String,
    /// Depreciation amount in USD.
    pub dep_amount: f64,
    /// Present only when the estimator ran for this row.
    pub llm_estimate: Option<LlmEstimate>,
    /// Diagnostic trail.
    pub trace: Trace,
}

/// Method that resolved a row's depreciation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategorizationMethod {
    /// Tier 1: keyword dictionary hit.
    Keyword,
    /// Tier 2: LLM classification, returned exactly.
    Llm,
    /// Tier 2: LLM classification repaired by fuzzy match.
    Fuzzy,
    /// Tier 3: heuristic substring default.
    Default,
}

/// The categorizer's output for one row.
#[derive(Debug, Clone)]
pub struct Categorization {
    /// Resolved category name, or empty if no tier matched.
    pub category: String,
    /// Annual depreciation rate in `[0, 1]`.
    pub dep_rate: f64,
    /// `round(total * dep_rate, 2)`.
    pub dep_amount: f64,
    /// Which tier produced `category`.
    pub method: CategorizationMethod,
}

/// A completed job's results, owned by `ResultStore` (an instantiation of
/// `pricing_cache::ResultStore<PricingResult>`).
#[derive(Debug, Clone)]
pub struct JobResults {
    /// Caller-supplied or generated job identifier.
    pub job_id: String,
    /// All results emitted for this job so far.
    pub rows: Vec<PricingResult>,
    /// When the job was created (epoch seconds), stamped by the caller.
    pub created_at: i64,
}
