//! QueryBuilder: turns item facts into an ordered list of search queries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MAX_QUERY_LEN: usize = 80;
const FILLER_WORDS: &[&str] = &["the", "a", "an", "with", "and", "of", "for"];

/// Which QueryBuilder pass produced a query; carried through to ranking so
/// the pipeline's fallback logic can tell "exact" from "generic" passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Pass 1/2: brand + model (or brand-only) + core nouns.
    Exact,
    /// Pass 3: synonym-rewritten generic/bulk term.
    Generic,
    /// Pass 4/5: core nouns + attribute, or category baseline.
    Enriched,
}

/// A single search query, the strategy that produced it, and its pass index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// The text to send to the search provider.
    pub text: String,
    /// The pass that produced this query.
    pub strategy: Strategy,
    /// 1-based pass index, used as a tie-break (earlier passes preferred).
    pub pass_index: u8,
}

/// Minimal facts the QueryBuilder needs; a subset of `pricing_core::Facts`
/// kept local so this crate has no dependency on pricing-core.
#[derive(Debug, Clone, Default)]
pub struct QueryFacts {
    /// Enhanced or raw item title.
    pub title: String,
    /// Brand name, if any ("No Brand" should already be normalized to None).
    pub brand: Option<String>,
    /// Model name/number, if any.
    pub model: Option<String>,
    /// Broad product category (e.g. "Furniture").
    pub category: String,
    /// Narrower subcategory (e.g. "Sofa").
    pub subcategory: String,
    /// Dominant attribute (color/material/size), if one was extracted.
    pub dominant_attribute: Option<String>,
}

/// Builds an ordered, best-first list of up to five search queries from
/// item facts and a synonym table for generic/bulk terms.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    synonyms: HashMap<String, String>,
}

impl QueryBuilder {
    /// An empty builder; no generic-term rewrites are known.
    pub fn new() -> Self {
        Self { synonyms: HashMap::new() }
    }

    /// Register a generic-term rewrite, e.g. `"iron and ironing board"` ->
    /// `"full size ironing board with iron rest"`.
    pub fn with_synonym(mut self, generic: impl Into<String>, rewrite: impl Into<String>) -> Self {
        self.synonyms.insert(generic.into().to_lowercase(), rewrite.into());
        self
    }

    /// Build the ordered query list for the given facts.
    pub fn build(&self, facts: &QueryFacts) -> Vec<Query> {
        let mut queries = Vec::with_capacity(5);
        let core = core_nouns(&facts.title);

        if let (Some(brand), Some(model)) = (&facts.brand, &facts.model) {
            queries.push(query(Strategy::Exact, 1, format!("{brand} {model} {core}")));
        }
        if let Some(brand) = &facts.brand {
            queries.push(query(Strategy::Exact, 2, format!("{brand} {core}")));
        }
        if let Some(rewrite) = self.lookup_synonym(&facts.title) {
            queries.push(query(Strategy::Generic, 3, rewrite));
        }
        if let Some(attr) = &facts.dominant_attribute {
            queries.push(query(Strategy::Enriched, 4, format!("{core} {attr}")));
        }
        queries.push(query(
            Strategy::Enriched,
            5,
            format!("{} {}", facts.category, facts.subcategory),
        ));

        queries.truncate(5);
        queries.sort_by(|a, b| {
            a.pass_index
                .cmp(&b.pass_index)
                .then_with(|| distinct_token_count(&b.text).cmp(&distinct_token_count(&a.text)))
        });
        queries
    }

    fn lookup_synonym(&self, title: &str) -> Option<String> {
        let lower = title.to_lowercase();
        self.synonyms
            .iter()
            .find(|(generic, _)| lower.contains(generic.as_str()))
            .map(|(_, rewrite)| rewrite.clone())
    }
}

fn query(strategy: Strategy, pass_index: u8, text: String) -> Query {
    Query { text: trim_query(&dedupe_words(&text)), strategy, pass_index }
}

/// Drop repeated words (case-insensitive), keeping the first occurrence.
/// Applied to the full query text so a brand prepended onto a title that
/// already contains it (e.g. "Bissell" + "bissell vacuum") doesn't repeat.
fn dedupe_words(text: &str) -> String {
    let mut seen = std::collections::HashSet::new();
    text.split_whitespace().filter(|w| seen.insert(w.to_lowercase())).collect::<Vec<_>>().join(" ")
}

/// Collapse whitespace, drop filler words, and cap length at ~80 chars.
fn trim_query(text: &str) -> String {
    let mut words: Vec<&str> = text
        .split_whitespace()
        .filter(|w| !FILLER_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();
    let mut joined = words.join(" ");
    if joined.len() > MAX_QUERY_LEN {
        while joined.len() > MAX_QUERY_LEN && !words.is_empty() {
            words.pop();
            joined = words.join(" ");
        }
    }
    joined
}

/// Strip duplicate/filler tokens from a title, keeping the first
/// occurrence of each distinct word (handles inputs like
/// "bissell bissell vacuum" collapsing the repeated brand token).
fn core_nouns(title: &str) -> String {
    let mut seen = std::collections::HashSet::new();
    title
        .split_whitespace()
        .filter(|w| seen.insert(w.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn distinct_token_count(text: &str) -> usize {
    text.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<std::collections::HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts() -> QueryFacts {
        QueryFacts {
            title: "bissell bissell vacuum".to_string(),
            brand: Some("Bissell".to_string()),
            model: Some("PowerForce".to_string()),
            category: "Appliances".to_string(),
            subcategory: "Vacuum".to_string(),
            dominant_attribute: Some("upright".to_string()),
        }
    }

    #[test]
    fn builds_exact_pass_with_brand_and_model() {
        let builder = QueryBuilder::new();
        let queries = builder.build(&facts());
        assert!(queries.iter().any(|q| q.strategy == Strategy::Exact && q.text.contains("PowerForce")));
    }

    #[test]
    fn deduplicates_repeated_brand_token_in_title() {
        let builder = QueryBuilder::new();
        let queries = builder.build(&facts());
        let pass2 = queries.iter().find(|q| q.pass_index == 2).unwrap();
        assert_eq!(pass2.text.matches("bissell").count() + pass2.text.matches("Bissell").count(), 1);
    }

    #[test]
    fn applies_generic_synonym_rewrite() {
        let builder = QueryBuilder::new()
            .with_synonym("iron and ironing board", "full size ironing board with iron rest");
        let mut f = facts();
        f.title = "iron and ironing board".to_string();
        f.brand = None;
        f.model = None;
        let queries = builder.build(&f);
        assert!(queries.iter().any(|q| q.strategy == Strategy::Generic));
    }

    #[test]
    fn caps_query_length() {
        let builder = QueryBuilder::new();
        let mut f = facts();
        f.category = "A ".repeat(60);
        let queries = builder.build(&f);
        assert!(queries.iter().all(|q| q.text.len() <= MAX_QUERY_LEN));
    }

    #[test]
    fn orders_queries_by_pass_index_primarily() {
        let builder = QueryBuilder::new();
        let queries = builder.build(&facts());
        for window in queries.windows(2) {
            assert!(window[0].pass_index < window[1].pass_index);
        }
    }

    #[test]
    fn token_count_only_breaks_ties_within_the_same_pass() {
        // Two queries sharing a pass_index are ordered by distinct token
        // count descending; pass_index itself is never overridden by it.
        let fewer = Query { text: "xray yoke".to_string(), strategy: Strategy::Enriched, pass_index: 4 };
        let more = Query { text: "xray yoke zeta".to_string(), strategy: Strategy::Enriched, pass_index: 4 };
        let mut queries = [fewer, more];
        queries.sort_by(|x, y| {
            x.pass_index
                .cmp(&y.pass_index)
                .then_with(|| distinct_token_count(&y.text).cmp(&distinct_token_count(&x.text)))
        });
        assert_eq!(queries[0].text, "xray yoke zeta");
    }
}
