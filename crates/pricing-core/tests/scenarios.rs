//! End-to-end scenarios from spec §8, run through the full
//! `PricingPipeline` with fake search/LLM collaborators. Each test
//! exercises one named scenario rather than a single unit in isolation.

use async_trait::async_trait;
use pricing_core::{default_categories, Categorizer, PipelineCaches, PricingPipeline, Row, Status};
use pricing_llm::{LlmRouter, MockProvider};
use pricing_search::{
    Error as SearchError, Offer, PriceBand, QueryBuilder, Result as SearchResult, RetryPolicy,
    SearchProvider, TrustPolicy, UrlResolver,
};
use std::sync::Arc;
use std::time::Duration;

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 1,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(1),
        base_timeout: Duration::from_secs(2),
        max_timeout: Duration::from_secs(2),
        ..Default::default()
    }
}

fn offer(price: f64, source: &str, link: &str, similarity: f64) -> Offer {
    Offer {
        title: "test offer".to_string(),
        price,
        source: source.to_string(),
        link: Some(link.to_string()),
        merchants: vec![],
        product_id: None,
        similarity,
    }
}

fn row(description: &str, purchase_price: Option<f64>, qty: u32) -> Row {
    Row {
        row_index: 1,
        description: description.to_string(),
        qty,
        purchase_price,
        brand: None,
        model: None,
        room: None,
        age_years: None,
        condition: None,
    }
}

/// A search provider that returns a fixed offer set on every call,
/// regardless of query text.
struct StaticSearch(Vec<Offer>);

#[async_trait]
impl SearchProvider for StaticSearch {
    fn name(&self) -> &str {
        "static"
    }

    async fn search_once(&self, _query: &str, _band: Option<PriceBand>) -> SearchResult<Vec<Offer>> {
        Ok(self.0.clone())
    }
}

/// A search provider that fails every call, simulating a hard-down backend.
struct AlwaysDown;

#[async_trait]
impl SearchProvider for AlwaysDown {
    fn name(&self) -> &str {
        "down"
    }

    async fn search_once(&self, _query: &str, _band: Option<PriceBand>) -> SearchResult<Vec<Offer>> {
        Err(SearchError::ProviderDown("simulated outage".to_string()))
    }
}

async fn run_scenario(
    search: &dyn SearchProvider,
    llm_response: &str,
    row: Row,
    tolerance_pct: f64,
) -> pricing_core::PricingResult {
    let trust = TrustPolicy::with_defaults();
    let query_builder = QueryBuilder::new();
    let resolver = UrlResolver::new();
    let retry = fast_retry();
    let mut router = LlmRouter::new("mock");
    router.register("mock", Arc::new(MockProvider::new(llm_response)));
    let categories = default_categories();
    let categorizer = Categorizer::new(&categories, None);
    let caches = PipelineCaches::new(pricing_cache::CacheConfig { ttl: Duration::from_secs(60), capacity: 100 });

    let pipeline = PricingPipeline::new(
        &trust,
        &query_builder,
        search,
        &resolver,
        &retry,
        &router,
        &categorizer,
        &caches,
        tolerance_pct,
        100.0,
        8,
    );

    pipeline.run_row(row).await
}

/// Scenario A: a direct-product offer from a trusted retailer inside the
/// tolerance band short-circuits to `Found` via QuickMatch.
#[tokio::test]
async fn scenario_a_trusted_direct_offer_in_band_is_found() {
    let search = StaticSearch(vec![offer(379.0, "walmart.com", "https://www.walmart.com/ip/55123", 0.9)]);
    let result = run_scenario(&search, "KitchenAid stand mixer", row("KitchenAid Professional 5 Quart Stand Mixer", Some(400.0), 1), 50.0).await;

    assert_eq!(result.status, Status::Found);
    assert_eq!(result.source, "Walmart");
    assert_eq!(result.price, 379.0);
    assert_eq!(result.total_replacement_price, 379.0);
    assert!(result.dep_amount >= 0.0 && result.dep_amount <= result.total_replacement_price);
}

/// Scenario B (spec §8): only untrusted/generic results come back, so no
/// offer ever qualifies as a trust-qualified `MarketSearch` candidate either
/// — `best_candidate` only tracks trusted offers, so this falls straight
/// through to `purchase_price`.
#[tokio::test]
async fn scenario_b_untrusted_only_falls_back_to_purchase_price() {
    let search = StaticSearch(vec![offer(48.0, "ebay.com", "https://www.ebay.com/itm/1", 0.8)]);
    let result = run_scenario(&search, "table lamp", row("Lamps", Some(50.0), 2), 50.0).await;

    assert_eq!(result.status, Status::Estimated);
    assert_eq!(result.price, 50.0);
    assert_eq!(result.total_replacement_price, 100.0);
    assert!(result.url.as_deref().is_some_and(|u| u.contains("walmart.com")));
}

/// Scenario D: a duplicated-brand description ("Bissell Bissell Vacuum")
/// collapses before search, and a qualifying trusted offer is found.
#[tokio::test]
async fn scenario_d_duplicate_brand_collapses_and_finds_trusted_offer() {
    let search = StaticSearch(vec![offer(115.0, "target.com", "https://www.target.com/p/A-12345", 0.9)]);
    let result = run_scenario(&search, "Bissell upright bagless vacuum", row("Bissell Bissell Vacuum", Some(120.0), 1), 50.0).await;

    assert_eq!(result.status, Status::Found);
    assert_eq!(result.source, "Target");
}

/// Scenario E (spec §8): missing purchase price triggers the LLM estimator,
/// and an untrusted-only search result never displaces that estimate —
/// price stays at the estimator's $175, with at least one untrusted-skip
/// trace entry recorded for the Craigslist offer.
#[tokio::test]
async fn scenario_e_missing_price_runs_estimator_and_records_untrusted_skip() {
    let search = StaticSearch(vec![offer(60.0, "craigslist.org", "https://craigslist.org/item/1", 0.7)]);
    let result = run_scenario(&search, r#"{"price": 175, "confidence": "low", "reasoning": "antique estimate"}"#, row("Rare Antique Clock", None, 1), 50.0).await;

    assert_eq!(result.status, Status::Estimated);
    let estimate = result.llm_estimate.expect("estimator should have run");
    assert_eq!(estimate.source, "LLM Estimate");
    assert_eq!(result.price, 175.0);
    assert_eq!(result.total_replacement_price, 175.0);
    assert!(!result.trace.untrusted_skipped.is_empty());
}

/// Scenario (provider-down variant): every search call fails, so the row
/// still emits exactly one `Estimated` result anchored on purchase price —
/// the fallback guarantee (spec §8.8) holds even under total provider outage.
#[tokio::test]
async fn provider_hard_down_still_emits_one_estimated_result() {
    let search = AlwaysDown;
    let result = run_scenario(&search, "desk lamp", row("Desk Lamp", Some(35.0), 1), 50.0).await;

    assert_eq!(result.status, Status::Estimated);
    assert_eq!(result.price, 35.0);
    assert_eq!(result.total_replacement_price, 35.0);
    assert!(result.url.is_some());
}

/// Testable property (spec §8.3): total conservation holds for any qty.
#[tokio::test]
async fn total_replacement_price_always_equals_price_times_qty_rounded() {
    let search = AlwaysDown;
    let result = run_scenario(&search, "desk lamp", row("Desk Lamp", Some(33.333), 3), 50.0).await;

    let expected = (result.price * 3.0 * 100.0).round() / 100.0;
    assert_eq!(result.total_replacement_price, expected);
}

/// Testable property (spec §8.4): depreciation is always within
/// `[0, total_replacement_price]`.
#[tokio::test]
async fn depreciation_amount_is_bounded_by_total() {
    let search = StaticSearch(vec![offer(200.0, "walmart.com", "https://www.walmart.com/ip/9", 0.9)]);
    let result = run_scenario(&search, "leather sofa", row("Leather Sofa", Some(210.0), 1), 50.0).await;

    assert!(result.dep_amount >= 0.0);
    assert!(result.dep_amount <= result.total_replacement_price);
}
