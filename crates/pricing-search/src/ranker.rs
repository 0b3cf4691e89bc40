//! OfferRanker: scores and filters candidate offers by similarity, trust,
//! and proximity to a target price.

use crate::offer::Offer;
use crate::query::Strategy;
use crate::resolver::UrlResolver;
use crate::trust::{TrustPolicy, TrustTier};

const MIN_PRICE: f64 = 0.10;
const EXACT_SIMILARITY_FLOOR: f64 = 0.45;

const W_SIMILARITY: f64 = 0.35;
const W_TRUST: f64 = 0.25;
const W_PRICE_FIT: f64 = 0.25;
const W_DIRECT_URL: f64 = 0.10;
const W_LOW_PRICE_PENALTY: f64 = 0.05;

/// The tolerance band around a target price.
#[derive(Debug, Clone, Copy)]
pub struct ToleranceBand {
    /// Lower bound, inclusive.
    pub low: f64,
    /// Upper bound, inclusive.
    pub high: f64,
}

impl ToleranceBand {
    /// Build a band `[target * (1 - t), target * (1 + t)]` from a
    /// percentage tolerance (e.g. `50.0` for +/-50%).
    pub fn from_tolerance_pct(target: f64, tolerance_pct: f64) -> Self {
        let t = tolerance_pct / 100.0;
        Self { low: target * (1.0 - t), high: target * (1.0 + t) }
    }

    /// Whether `price` falls inside the band.
    pub fn contains(&self, price: f64) -> bool {
        price >= self.low && price <= self.high
    }
}

/// An offer paired with its computed rank score and in-band status.
#[derive(Debug, Clone)]
pub struct RankedOffer {
    /// The underlying offer.
    pub offer: Offer,
    /// Composite rank score; higher is better.
    pub score: f64,
    /// Whether the offer's price falls inside the tolerance band.
    pub in_band: bool,
}

/// Scores offers by similarity, trust tier, price fit, and URL directness,
/// then selects a winner per the pipeline's strategy-dependent rule.
pub struct OfferRanker<'a> {
    trust: &'a TrustPolicy,
}

impl<'a> OfferRanker<'a> {
    /// Build a ranker bound to a trust policy.
    pub fn new(trust: &'a TrustPolicy) -> Self {
        Self { trust }
    }

    /// Score and filter `offers` against `target` and `band`, dropping
    /// disqualified offers (too cheap, or from a blocked source/URL).
    pub fn rank(&self, offers: Vec<Offer>, target: f64, band: ToleranceBand) -> Vec<RankedOffer> {
        let mut ranked: Vec<RankedOffer> = offers
            .into_iter()
            .filter(|o| !self.is_disqualified(o, target))
            .map(|o| {
                let in_band = band.contains(o.price);
                let score = self.score(&o, target, band);
                RankedOffer { offer: o, score, in_band }
            })
            .collect();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    /// Select a winner from already-ranked offers following the
    /// strategy-dependent rule: exact-strategy queries prefer the lowest
    /// price among offers meeting the similarity floor; everything else
    /// prefers the lowest qualified price outright (insurance principle:
    /// actual replaceability, not best match).
    pub fn select<'o>(&self, ranked: &'o [RankedOffer], strategy: Strategy) -> Option<&'o RankedOffer> {
        if strategy == Strategy::Exact {
            let candidate = ranked
                .iter()
                .filter(|r| r.offer.similarity >= EXACT_SIMILARITY_FLOOR)
                .min_by(|a, b| a.offer.price.partial_cmp(&b.offer.price).unwrap());
            if candidate.is_some() {
                return candidate;
            }
        }
        ranked.iter().min_by(|a, b| a.offer.price.partial_cmp(&b.offer.price).unwrap())
    }

    fn is_disqualified(&self, offer: &Offer, target: f64) -> bool {
        if offer.price < MIN_PRICE {
            return true;
        }
        if offer.price < target * 0.01 {
            return true;
        }
        if self.trust.classify_source(&offer.source) == TrustTier::Untrusted {
            return true;
        }
        if let Some(link) = &offer.link {
            if self.trust.is_blocked_url(link) {
                return true;
            }
        }
        false
    }

    fn score(&self, offer: &Offer, target: f64, band: ToleranceBand) -> f64 {
        let trust_bonus = match self.trust.classify_source(&offer.source) {
            TrustTier::Trusted => 1.0,
            TrustTier::Unknown => 0.4,
            TrustTier::Untrusted => 0.0,
        };
        let price_fit = if band.contains(offer.price) {
            1.0 - ((offer.price - target).abs() / target.max(1.0)).min(1.0)
        } else {
            0.0
        };
        let direct_bonus = offer
            .link
            .as_deref()
            .map(|l| if UrlResolver::is_direct_product_url(l) { 1.0 } else { 0.0 })
            .unwrap_or(0.0);
        let low_price_penalty = if offer.price < target * 0.1 { 1.0 } else { 0.0 };

        W_SIMILARITY * offer.similarity + W_TRUST * trust_bonus + W_PRICE_FIT * price_fit
            + W_DIRECT_URL * direct_bonus
            - W_LOW_PRICE_PENALTY * low_price_penalty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(price: f64, source: &str, similarity: f64) -> Offer {
        Offer {
            title: "test".to_string(),
            price,
            source: source.to_string(),
            link: Some(format!("https://{source}/ip/1")),
            merchants: vec![],
            product_id: None,
            similarity,
        }
    }

    #[test]
    fn disqualifies_sub_floor_and_untrusted_offers() {
        let trust = TrustPolicy::with_defaults();
        let ranker = OfferRanker::new(&trust);
        let offers = vec![offer(0.05, "walmart.com", 0.9), offer(40.0, "ebay.com", 0.9)];
        let ranked = ranker.rank(offers, 50.0, ToleranceBand::from_tolerance_pct(50.0, 50.0));
        assert!(ranked.is_empty());
    }

    #[test]
    fn trust_never_lowers_rank_monotonicity() {
        let trust = TrustPolicy::with_defaults();
        let ranker = OfferRanker::new(&trust);
        let band = ToleranceBand::from_tolerance_pct(50.0, 50.0);
        let trusted = offer(50.0, "walmart.com", 0.9);
        let unknown = offer(50.0, "someshop.example", 0.9);
        let trusted_score = ranker.score(&trusted, 50.0, band);
        let unknown_score = ranker.score(&unknown, 50.0, band);
        assert!(trusted_score >= unknown_score);
    }

    #[test]
    fn exact_strategy_prefers_lowest_price_above_similarity_floor() {
        let trust = TrustPolicy::with_defaults();
        let ranker = OfferRanker::new(&trust);
        let band = ToleranceBand::from_tolerance_pct(50.0, 50.0);
        let offers = vec![offer(45.0, "walmart.com", 0.9), offer(30.0, "target.com", 0.2)];
        let ranked = ranker.rank(offers, 50.0, band);
        let winner = ranker.select(&ranked, Strategy::Exact).unwrap();
        assert_eq!(winner.offer.price, 45.0);
    }

    #[test]
    fn generic_strategy_prefers_lowest_qualified_price() {
        let trust = TrustPolicy::with_defaults();
        let ranker = OfferRanker::new(&trust);
        let band = ToleranceBand::from_tolerance_pct(50.0, 50.0);
        let offers = vec![offer(45.0, "walmart.com", 0.9), offer(30.0, "target.com", 0.2)];
        let ranked = ranker.rank(offers, 50.0, band);
        let winner = ranker.select(&ranked, Strategy::Enriched).unwrap();
        assert_eq!(winner.offer.price, 30.0);
    }

    #[test]
    fn tolerance_band_math() {
        let band = ToleranceBand::from_tolerance_pct(100.0, 50.0);
        assert_eq!(band.low, 50.0);
        assert_eq!(band.high, 150.0);
        assert!(band.contains(100.0));
        assert!(!band.contains(200.0));
    }
}
