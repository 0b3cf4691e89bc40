//! `PricingPipeline`: the per-row state machine (spec §4.8).
//!
//! States: `Enhance -> QuickMatch -> EnrichedSearch -> Resolve -> Classify ->
//! ToleranceFallback -> MarketSearch -> PurchasePriceFallback -> Emit`.
//! `run_row` drives these in order as a sequence of private stage methods;
//! each stage either returns a terminal `PricingResult` (short-circuiting to
//! `Emit`) or hands an accumulator forward to the next stage. No stage ever
//! returns an `Err` — per the never-fail contract, the worst case is
//! `purchase_price_fallback`, which always succeeds.

use crate::categorizer::Categorizer;
use crate::model::{Facts, LlmEstimate, MatchQuality, PricingResult, PricingTier, Row, Status, Trace};
use pricing_cache::Cache;
use pricing_llm::{DescriptionEnhancer, LlmRouter, PriceEstimator};
use pricing_search::{
    search_with_retry, Offer, OfferRanker, PriceBand, QueryBuilder, QueryFacts, RankedOffer,
    RetryPolicy, SearchProvider, Strategy, ToleranceBand, TrustPolicy, UrlResolver,
};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Drop repeated words (case-insensitive), keeping the first occurrence —
/// collapses a prepended brand/model that already appears in the enhanced
/// description (e.g. "Bissell" + "bissell vacuum").
fn dedupe_words(text: &str) -> String {
    let mut seen = std::collections::HashSet::new();
    text.split_whitespace().filter(|w| seen.insert(w.to_lowercase())).collect::<Vec<_>>().join(" ")
}

/// Shared TTL caches consulted at the LLM/search boundary (spec §4.11),
/// owned by the caller and passed in by reference so concurrent workers
/// share one store.
pub struct PipelineCaches {
    /// Normalized `(description|brand|model)` -> enhanced description.
    pub description: Cache<String, String>,
    /// Normalized `(query, price_band)` -> offer list.
    pub offers: Cache<String, Vec<Offer>>,
}

impl PipelineCaches {
    /// Build both caches with the given sizing.
    #[must_use]
    pub fn new(config: pricing_cache::CacheConfig) -> Self {
        Self {
            description: Cache::with_config(config),
            offers: Cache::with_config(config),
        }
    }
}

/// Per-row accumulator threaded through the pipeline's stages.
struct RowWork {
    row: Row,
    facts: Facts,
    purchase_price: f64,
    llm_estimate: Option<LlmEstimate>,
    trace: Trace,
    /// Cheapest floor-qualifying, trust-qualified offer seen across all
    /// search stages, carried forward in case every stage disqualifies on
    /// URL shape but `MarketSearch` still wants a price better than bare
    /// purchase price. Untrusted/blocked offers never populate this — an
    /// untrusted-only result set falls straight through to `purchase_price`
    /// (spec §8 scenario B).
    best_candidate: Option<f64>,
}

/// Orchestrates one row end-to-end: enhancement, search fan-out, ranking,
/// URL resolution, Found/Estimated classification, and ordered fallbacks.
pub struct PricingPipeline<'a> {
    trust: &'a TrustPolicy,
    query_builder: &'a QueryBuilder,
    search: &'a dyn SearchProvider,
    resolver: &'a UrlResolver,
    retry_policy: &'a RetryPolicy,
    enhancer: DescriptionEnhancer<'a>,
    estimator: PriceEstimator<'a>,
    categorizer: &'a Categorizer<'a>,
    caches: &'a PipelineCaches,
    tolerance_pct: f64,
    fallback_tolerance_pct: f64,
    /// Bounds concurrent outbound calls to the search/LLM providers,
    /// independent of (and tighter than) the scheduler's global worker cap
    /// (spec §5's per-provider concurrency limit).
    provider_permits: std::sync::Arc<tokio::sync::Semaphore>,
}

impl<'a> PricingPipeline<'a> {
    /// Assemble a pipeline from its collaborators. Everything is injected
    /// (design note: no global singletons) so tests substitute fakes.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trust: &'a TrustPolicy,
        query_builder: &'a QueryBuilder,
        search: &'a dyn SearchProvider,
        resolver: &'a UrlResolver,
        retry_policy: &'a RetryPolicy,
        llm_router: &'a LlmRouter,
        categorizer: &'a Categorizer<'a>,
        caches: &'a PipelineCaches,
        tolerance_pct: f64,
        fallback_tolerance_pct: f64,
        provider_concurrency: usize,
    ) -> Self {
        Self {
            trust,
            query_builder,
            search,
            resolver,
            retry_policy,
            enhancer: DescriptionEnhancer::new(llm_router),
            estimator: PriceEstimator::new(llm_router),
            categorizer,
            caches,
            tolerance_pct,
            fallback_tolerance_pct,
            provider_permits: std::sync::Arc::new(tokio::sync::Semaphore::new(provider_concurrency.max(1))),
        }
    }

    /// Acquire a provider-call slot, blocking until one is free. Wraps every
    /// outbound search/LLM call so the configured `provider_concurrency`
    /// cap holds regardless of how many row workers are running concurrently.
    async fn provider_slot(&self) -> tokio::sync::SemaphorePermit<'_> {
        self.provider_permits.acquire().await.expect("provider semaphore is never closed")
    }

    /// Run the full state machine for one row. Always returns a result;
    /// never propagates an error (spec §7's never-fail contract).
    pub async fn run_row(&self, row: Row) -> PricingResult {
        let mut work = self.enhance(row.normalized()).await;

        if let Some(result) = self.quick_match(&mut work).await {
            return result;
        }

        let (ranked, strategy) = self.enriched_search(&mut work).await;
        if let Some(result) = self.resolve_and_classify(&mut work, &ranked, strategy).await {
            return result;
        }

        if let Some(result) = self.tolerance_fallback(&mut work).await {
            return result;
        }

        self.market_search(&mut work).await
    }

    // ---- Stage 1: Enhance -------------------------------------------------

    async fn enhance(&self, row: Row) -> RowWork {
        let mut trace = Trace::default();

        let (purchase_price, llm_estimate) = match row.purchase_price {
            Some(price) if price > 0.0 => (price, None),
            _ => {
                let _permit = self.provider_slot().await;
                let estimate = self.estimator.estimate(&row.description, row.brand.as_deref()).await;
                let llm_estimate = LlmEstimate {
                    price: estimate.price,
                    confidence: format!("{:?}", estimate.confidence).to_lowercase(),
                    reasoning: estimate.reasoning.clone(),
                    source: estimate.source.clone(),
                };
                (estimate.price, Some(llm_estimate))
            }
        };

        let cache_key = pricing_cache::normalize_key(&format!(
            "{}|{}|{}",
            row.description,
            row.brand.as_deref().unwrap_or(""),
            row.model.as_deref().unwrap_or("")
        ));

        let enhanced = match self.caches.description.get(&cache_key).await {
            Some(cached) => cached,
            None => {
                let _permit = self.provider_slot().await;
                let result =
                    self.enhancer.enhance(&row.description, row.brand.as_deref(), row.model.as_deref()).await;
                self.caches.description.set(cache_key, result.clone()).await;
                result
            }
        };

        let title = dedupe_words(&match (&row.brand, &row.model) {
            (Some(brand), Some(model)) => format!("{brand} {model} {enhanced}"),
            (Some(brand), None) => format!("{brand} {enhanced}"),
            _ => enhanced,
        });

        trace.validation = "enhance".to_string();

        let facts = Facts {
            title,
            brand: row.brand.clone(),
            model: row.model.clone(),
            condition: row.condition.clone(),
            keywords: row.description.split_whitespace().map(str::to_lowercase).collect(),
            ..Facts::default()
        };

        RowWork { row, facts, purchase_price, llm_estimate, trace, best_candidate: None }
    }

    // ---- Stage 2: QuickMatch ----------------------------------------------

    async fn quick_match(&self, work: &mut RowWork) -> Option<PricingResult> {
        let band = ToleranceBand::from_tolerance_pct(work.purchase_price, self.tolerance_pct);
        let price_band = PriceBand { low: band.low, high: band.high };

        let query = work.facts.title.clone();
        let offers = {
            let _permit = self.provider_slot().await;
            search_with_retry(self.search, self.retry_policy, &query, Some(price_band)).await
        };

        work.trace.queries.push(query);
        work.trace.candidates_checked += offers.len() as u32;
        self.note_best_candidate(work, &offers);
        self.note_trust_skips(work, &offers);

        let ranker = OfferRanker::new(self.trust);
        let ranked = ranker.rank(offers, work.purchase_price, band);
        let winner = ranker.select(&ranked, Strategy::Exact)?;

        let direct = UrlResolver::is_direct_product_url(winner.offer.link.as_deref().unwrap_or(""));
        let trusted = winner.offer.link.as_deref().is_some_and(|l| self.trust.is_trusted_url(l));

        if direct && trusted && band.contains(winner.offer.price) {
            let url = winner.offer.link.clone();
            let source = url.as_deref().and_then(|u| self.trust.friendly_name(u)).unwrap_or_else(|| winner.offer.source.clone());
            let price = winner.offer.price;
            let result = self
                .emit(
                    std::mem::replace(work, RowWork::placeholder()),
                    Status::Found,
                    PricingTier::Serp,
                    MatchQuality::Exact,
                    source,
                    price,
                    url,
                    "quick_match: direct trusted offer in band",
                )
                .await;
            return Some(result);
        }
        None
    }

    // ---- Stage 3: EnrichedSearch -------------------------------------------

    async fn enriched_search(&self, work: &mut RowWork) -> (Vec<RankedOffer>, Strategy) {
        let query_facts = QueryFacts {
            title: work.facts.title.clone(),
            brand: work.facts.brand.clone(),
            model: work.facts.model.clone(),
            category: work.facts.category.clone(),
            subcategory: work.facts.subcategory.clone(),
            dominant_attribute: work.facts.attributes.first().cloned(),
        };
        let queries = self.query_builder.build(&query_facts);

        let band = ToleranceBand::from_tolerance_pct(work.purchase_price, self.tolerance_pct);
        let price_band = PriceBand { low: band.low, high: band.high };

        let mut all_offers = Vec::new();
        let mut used_exact = false;

        for query in &queries {
            if query.strategy == Strategy::Exact {
                used_exact = true;
            }

            let cache_key =
                pricing_cache::normalize_key(&format!("{}|{:.2}|{:.2}", query.text, band.low, band.high));

            let offers = match self.caches.offers.get(&cache_key).await {
                Some(cached) => cached,
                None => {
                    let offers = {
                        let _permit = self.provider_slot().await;
                        search_with_retry(self.search, self.retry_policy, &query.text, Some(price_band)).await
                    };
                    self.caches.offers.set(cache_key, offers.clone()).await;
                    offers
                }
            };

            work.trace.queries.push(query.text.clone());
            work.trace.candidates_checked += offers.len() as u32;
            self.note_best_candidate(work, &offers);
            self.note_trust_skips(work, &offers);
            all_offers.extend(offers);
        }

        let ranker = OfferRanker::new(self.trust);
        let ranked = ranker.rank(all_offers, work.purchase_price, band);
        let strategy = if used_exact { Strategy::Exact } else { Strategy::Enriched };
        (ranked, strategy)
    }

    // ---- Stage 4/5: Resolve + Classify -------------------------------------

    async fn resolve_and_classify(
        &self,
        work: &mut RowWork,
        ranked: &[RankedOffer],
        strategy: Strategy,
    ) -> Option<PricingResult> {
        let ranker = OfferRanker::new(self.trust);
        let winner = ranker.select(ranked, strategy)?;

        let original_link = winner.offer.link.clone()?;
        let resolved_url = if UrlResolver::is_direct_product_url(&original_link) {
            original_link.clone()
        } else {
            self.resolver.resolve(&original_link, self.trust).await
        };

        let direct = UrlResolver::is_direct_product_url(&resolved_url);
        let trusted = self.trust.is_trusted_url(&resolved_url);
        let consistent = self.price_url_consistent(winner.offer.price, &resolved_url);

        if !(direct && trusted && consistent) {
            if !trusted {
                work.trace.untrusted_skipped.push(winner.offer.source.clone());
            } else {
                work.trace.trusted_skipped.push(winner.offer.source.clone());
            }
            return None;
        }

        let source = self.trust.friendly_name(&resolved_url).unwrap_or_else(|| winner.offer.source.clone());
        let price = winner.offer.price;
        let result = self
            .emit(
                std::mem::replace(work, RowWork::placeholder()),
                Status::Found,
                PricingTier::Serp,
                MatchQuality::Good,
                source,
                price,
                Some(resolved_url),
                "resolve_and_classify: direct trusted consistent offer",
            )
            .await;
        Some(result)
    }

    // ---- Stage 6: ToleranceFallback -----------------------------------------

    async fn tolerance_fallback(&self, work: &mut RowWork) -> Option<PricingResult> {
        let (ranked, strategy) = {
            let query_facts = QueryFacts {
                title: work.facts.title.clone(),
                brand: work.facts.brand.clone(),
                model: work.facts.model.clone(),
                category: work.facts.category.clone(),
                subcategory: work.facts.subcategory.clone(),
                dominant_attribute: work.facts.attributes.first().cloned(),
            };
            let queries = self.query_builder.build(&query_facts);
            let band = ToleranceBand::from_tolerance_pct(work.purchase_price, self.fallback_tolerance_pct);
            let price_band = PriceBand { low: band.low, high: band.high };

            let mut all_offers = Vec::new();
            for query in &queries {
                let offers = {
                    let _permit = self.provider_slot().await;
                    search_with_retry(self.search, self.retry_policy, &query.text, Some(price_band)).await
                };
                work.trace.queries.push(query.text.clone());
                work.trace.candidates_checked += offers.len() as u32;
                self.note_best_candidate(work, &offers);
                self.note_trust_skips(work, &offers);
                all_offers.extend(offers);
            }

            let ranker = OfferRanker::new(self.trust);
            let ranked = ranker.rank(all_offers, work.purchase_price, band);
            (ranked, Strategy::Enriched)
        };

        let ranker = OfferRanker::new(self.trust);
        let winner = ranker.select(&ranked, strategy)?;
        let price = winner.offer.price;
        let url = winner.offer.link.clone();
        let source = url
            .as_deref()
            .and_then(|u| self.trust.friendly_name(u))
            .unwrap_or_else(|| winner.offer.source.clone());

        let result = self
            .emit(
                std::mem::replace(work, RowWork::placeholder()),
                Status::Estimated,
                PricingTier::Fallback,
                MatchQuality::Approximate,
                source,
                price,
                url,
                "tolerance_fallback: widened-band lowest qualified offer",
            )
            .await;
        Some(result)
    }

    // ---- Stage 7/8: MarketSearch / PurchasePriceFallback --------------------

    async fn market_search(&self, work: &mut RowWork) -> PricingResult {
        let price = work.best_candidate.unwrap_or(work.purchase_price);
        let validation = if work.best_candidate.is_some() {
            "market_search: best trusted candidate seen, no qualifying direct URL"
        } else {
            "purchase_price_fallback: no candidate met the price floor"
        };

        let domain = pick_retailer_domain(&work.facts);
        let search_term = work.facts.title.replace(' ', "+");
        let url = format!("https://www.{domain}/search?q={search_term}");
        let source = self.trust.friendly_name(&url).unwrap_or_else(|| "Walmart".to_string());

        self.emit(
            std::mem::replace(work, RowWork::placeholder()),
            Status::Estimated,
            PricingTier::Fallback,
            MatchQuality::None,
            source,
            price,
            Some(url),
            validation,
        )
        .await
    }

    // ---- Shared helpers ------------------------------------------------------

    fn note_best_candidate(&self, work: &mut RowWork, offers: &[Offer]) {
        for offer in offers {
            if offer.price < 0.10 {
                continue;
            }
            let blocked = offer.link.as_deref().is_some_and(|l| self.trust.is_blocked_url(l));
            let trusted = self.trust.classify_source(&offer.source) == pricing_search::TrustTier::Trusted
                || offer.link.as_deref().is_some_and(|l| self.trust.is_trusted_url(l));
            if blocked || !trusted {
                continue;
            }
            let better = work.best_candidate.is_none_or(|best| offer.price < best);
            if better {
                work.best_candidate = Some(offer.price);
            }
        }
    }

    /// Records every raw offer's trust classification into the trace, ahead
    /// of ranking — `OfferRanker::rank` drops untrusted/blocked offers
    /// outright, so without this pass they'd vanish before ever being
    /// attributed in `trace.untrusted_skipped` (spec §8 scenario E).
    fn note_trust_skips(&self, work: &mut RowWork, offers: &[Offer]) {
        for offer in offers {
            let blocked = offer.link.as_deref().is_some_and(|l| self.trust.is_blocked_url(l));
            let untrusted = self.trust.classify_source(&offer.source) == pricing_search::TrustTier::Untrusted;
            if untrusted || blocked {
                work.trace.untrusted_skipped.push(offer.source.clone());
            }
        }
    }

    fn price_url_consistent(&self, price: f64, url: &str) -> bool {
        if self.trust.is_trusted_url(url) {
            return true;
        }
        match extract_price_from_url(url) {
            Some(embedded) => (embedded - price).abs() <= price * 0.5,
            None => true,
        }
    }

    /// Stage 9: Emit. Builds the final `PricingResult`, running the
    /// depreciation categorizer against the (now-final) total.
    #[allow(clippy::too_many_arguments)]
    async fn emit(
        &self,
        work: RowWork,
        status: Status,
        tier: PricingTier,
        quality: MatchQuality,
        source: String,
        price: f64,
        url: Option<String>,
        validation: &str,
    ) -> PricingResult {
        let qty = f64::from(work.row.qty);
        let total = round2(price * qty);
        let cost_to_replace = round2(work.purchase_price * qty);

        let categorization = {
            let _permit = self.provider_slot().await;
            self.categorizer.classify(&work.facts.title, total).await
        };

        let mut trace = work.trace;
        trace.validation = validation.to_string();

        PricingResult {
            row_index: work.row.row_index,
            description: work.row.description,
            brand: work.row.brand.unwrap_or_else(|| "No Brand".to_string()),
            status,
            source,
            price,
            total_replacement_price: total,
            cost_to_replace,
            url,
            match_quality: quality.label().to_string(),
            pricing_tier: tier.label().to_string(),
            dep_category: categorization.category,
            dep_percent: format!("{:.4}%", categorization.dep_rate * 100.0),
            dep_amount: categorization.dep_amount,
            llm_estimate: work.llm_estimate,
            trace,
        }
    }
}

/// Plausible-retailer heuristic for `MarketSearch` (spec §4.8.7): picks a
/// trusted retailer's site-search domain by product-type keyword in the
/// title/category, falling back to Walmart for anything unmatched.
const RETAILER_KEYWORDS: &[(&[&str], &str)] = &[
    (&["sofa", "couch", "loveseat", "dresser", "nightstand", "mattress", "ottoman", "bed frame"], "wayfair.com"),
    (&["drill", "saw", "hardware", "wrench", "hammer", "ladder", "hinge", "bolt"], "homedepot.com"),
    (&["tv", "television", "laptop", "computer", "monitor", "camera", "speaker", "headphone"], "bestbuy.com"),
    (&["yarn", "frame", "canvas", "craft", "scrapbook", "paint brush"], "michaels.com"),
    (&["mixer", "blender", "microwave", "refrigerator", "stove", "cookware", "toaster"], "target.com"),
];

fn pick_retailer_domain(facts: &Facts) -> &'static str {
    let haystack = format!("{} {}", facts.title, facts.category).to_lowercase();
    for (keywords, domain) in RETAILER_KEYWORDS {
        if keywords.iter().any(|kw| haystack.contains(kw)) {
            return domain;
        }
    }
    "walmart.com"
}

fn extract_price_from_url(url: &str) -> Option<f64> {
    let idx = url.find('$')?;
    let rest = &url[idx + 1..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
    digits.parse::<f64>().ok()
}

impl RowWork {
    /// A cheap placeholder used only as the `mem::replace` source when a
    /// stage consumes `work` to build its terminal result.
    fn placeholder() -> Self {
        Self {
            row: Row {
                row_index: 0,
                description: String::new(),
                qty: 1,
                purchase_price: None,
                brand: None,
                model: None,
                room: None,
                age_years: None,
                condition: None,
            },
            facts: Facts::default(),
            purchase_price: 0.0,
            llm_estimate: None,
            trace: Trace::default(),
            best_candidate: None,
        }
    }
}
