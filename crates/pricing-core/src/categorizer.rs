//! Tiered depreciation categorizer (spec §4.9): keyword dictionary, then
//! LLM classification with fuzzy repair, then a heuristic substring default.

use crate::config::CategoryEntry;
use crate::model::{Categorization, CategorizationMethod};
use pricing_llm::{CategorizerLlm, LlmRouter};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The compiled-in fallback category table used when no table is injected
/// by configuration (spec §4.9's "declared in-code fallback table").
#[must_use]
pub fn default_categories() -> Vec<CategoryEntry> {
    vec![
        CategoryEntry {
            name: "Electronics".to_string(),
            dep_rate: 0.20,
            keywords: vec![
                "tv", "television", "electronic", "computer", "laptop", "phone", "tablet",
                "camera", "speaker", "console", "monitor",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        },
        CategoryEntry {
            name: "Furniture".to_string(),
            dep_rate: 0.10,
            keywords: vec!["sofa", "chair", "table", "desk", "dresser", "bed", "cabinet", "shelf", "furniture"]
                .into_iter()
                .map(String::from)
                .collect(),
        },
        CategoryEntry {
            name: "Appliances".to_string(),
            dep_rate: 0.12,
            keywords: vec![
                "refrigerator", "washer", "dryer", "dishwasher", "microwave", "oven", "vacuum",
                "appliance",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        },
        CategoryEntry {
            name: "Clothing".to_string(),
            dep_rate: 0.30,
            keywords: vec!["shirt", "pants", "dress", "jacket", "shoes", "clothing", "apparel"]
                .into_iter()
                .map(String::from)
                .collect(),
        },
        CategoryEntry {
            name: "Jewelry".to_string(),
            dep_rate: 0.05,
            keywords: vec!["ring", "necklace", "bracelet", "jewelry", "watch"]
                .into_iter()
                .map(String::from)
                .collect(),
        },
        CategoryEntry {
            name: "Tools".to_string(),
            dep_rate: 0.15,
            keywords: vec!["drill", "saw", "tool", "wrench", "hammer"]
                .into_iter()
                .map(String::from)
                .collect(),
        },
        CategoryEntry {
            name: "Sporting Goods".to_string(),
            dep_rate: 0.15,
            keywords: vec!["bike", "bicycle", "treadmill", "exercise", "sporting"]
                .into_iter()
                .map(String::from)
                .collect(),
        },
        CategoryEntry {
            name: "Miscellaneous".to_string(),
            dep_rate: 0.10,
            keywords: vec!["misc".to_string()],
        },
    ]
}

/// Tiered classifier: keyword dictionary, then LLM with fuzzy repair, then a
/// substring-heuristic default.
pub struct Categorizer<'a> {
    table: &'a [CategoryEntry],
    names: Vec<String>,
    llm_router: Option<&'a LlmRouter>,
}

impl<'a> Categorizer<'a> {
    /// Build a categorizer over `table`. Pass `llm_router` to enable tier 2;
    /// without it, classification falls straight from tier 1 to tier 3.
    #[must_use]
    pub fn new(table: &'a [CategoryEntry], llm_router: Option<&'a LlmRouter>) -> Self {
        let names = table.iter().map(|c| c.name.clone()).collect();
        Self { table, names, llm_router }
    }

    fn dep_rate_for(&self, category: &str) -> f64 {
        self.table.iter().find(|c| c.name == category).map(|c| c.dep_rate).unwrap_or(0.0)
    }

    /// Tier 1: whole-word keyword dictionary scan. Returns the category with
    /// the most hits; ties go to the first category in table order. `None`
    /// if every category scored zero.
    fn keyword_tier(&self, text: &str) -> Option<&str> {
        let words: std::collections::HashSet<String> =
            text.split_whitespace().map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase()).collect();

        let mut best: Option<(&str, usize)> = None;
        for entry in self.table {
            let score = entry.keywords.iter().filter(|kw| words.contains(kw.as_str())).count();
            if score > 0 && best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((entry.name.as_str(), score));
            }
        }
        best.map(|(name, _)| name)
    }

    /// Tier 3: substring heuristic default. Any category whose keyword
    /// appears as a substring anywhere in `text` wins (first table match).
    fn default_tier(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.table
            .iter()
            .find(|entry| entry.keywords.iter().any(|kw| lower.contains(kw.as_str())))
            .map(|entry| entry.name.as_str())
    }

    fn build(&self, category: &str, method: CategorizationMethod, total: f64) -> Categorization {
        let dep_rate = self.dep_rate_for(category);
        Categorization {
            category: category.to_string(),
            dep_rate,
            dep_amount: round2(total * dep_rate),
            method,
        }
    }

    fn empty(&self, total: f64) -> Categorization {
        let _ = total;
        Categorization { category: String::new(), dep_rate: 0.0, dep_amount: 0.0, method: CategorizationMethod::Default }
    }

    /// Classify one item, trying tiers 1 -> 2 -> 3 in order.
    pub async fn classify(&self, description: &str, total: f64) -> Categorization {
        if let Some(category) = self.keyword_tier(description) {
            return self.build(category, CategorizationMethod::Keyword, total);
        }

        if let Some(router) = self.llm_router {
            let llm = CategorizerLlm::new(router, &self.names);
            if let Some(category) = llm.classify_one(description).await {
                let method = if self.names.iter().any(|n| n == &category) {
                    CategorizationMethod::Llm
                } else {
                    CategorizationMethod::Fuzzy
                };
                return self.build(&category, method, total);
            }
        }

        if let Some(category) = self.default_tier(description) {
            return self.build(category, CategorizationMethod::Default, total);
        }

        self.empty(total)
    }

    /// Batch classify: tier 1/3 run per item locally; any item tier 1 missed
    /// is sent to the LLM in a single N-line call (spec §4.9 batch mode).
    pub async fn classify_batch(&self, items: &[(String, f64)]) -> Vec<Categorization> {
        let mut results: Vec<Option<Categorization>> = Vec::with_capacity(items.len());
        let mut pending_indices = Vec::new();
        let mut pending_descriptions = Vec::new();

        for (idx, (description, total)) in items.iter().enumerate() {
            if let Some(category) = self.keyword_tier(description) {
                results.push(Some(self.build(category, CategorizationMethod::Keyword, *total)));
            } else {
                results.push(None);
                pending_indices.push(idx);
                pending_descriptions.push(description.clone());
            }
        }

        if let Some(router) = self.llm_router {
            if !pending_descriptions.is_empty() {
                let llm = CategorizerLlm::new(router, &self.names);
                let llm_results = llm.classify_batch(&pending_descriptions).await;
                for (pos, idx) in pending_indices.iter().enumerate() {
                    if let Some(Some(category)) = llm_results.get(pos) {
                        let total = items[*idx].1;
                        let method = if self.names.iter().any(|n| n == category) {
                            CategorizationMethod::Llm
                        } else {
                            CategorizationMethod::Fuzzy
                        };
                        results[*idx] = Some(self.build(category, method, total));
                    }
                }
            }
        }

        results
            .into_iter()
            .zip(items.iter())
            .map(|(result, (description, total))| {
                result.unwrap_or_else(|| {
                    self.default_tier(description)
                        .map(|category| self.build(category, CategorizationMethod::Default, *total))
                        .unwrap_or_else(|| self.empty(*total))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keyword_tier_wins_on_whole_word_hit() {
        let table = default_categories();
        let categorizer = Categorizer::new(&table, None);
        let result = categorizer.classify("Samsung 55in television", 100.0).await;
        assert_eq!(result.category, "Electronics");
        assert_eq!(result.method, CategorizationMethod::Keyword);
        assert_eq!(result.dep_amount, 20.0);
    }

    #[tokio::test]
    async fn no_tier_matches_leaves_category_empty() {
        let table = default_categories();
        let categorizer = Categorizer::new(&table, None);
        let result = categorizer.classify("unidentifiable widget", 100.0).await;
        assert_eq!(result.category, "");
        assert_eq!(result.dep_amount, 0.0);
    }

    #[tokio::test]
    async fn default_tier_matches_on_substring_without_llm() {
        let table = default_categories();
        let categorizer = Categorizer::new(&table, None);
        let result = categorizer.classify("a chairlike seat", 50.0).await;
        assert_eq!(result.category, "Furniture");
        assert_eq!(result.method, CategorizationMethod::Default);
    }

    #[tokio::test]
    async fn batch_mode_resolves_each_item_independently() {
        let table = default_categories();
        let categorizer = Categorizer::new(&table, None);
        let items = vec![
            ("leather sofa".to_string(), 200.0),
            ("unidentifiable widget".to_string(), 50.0),
        ];
        let results = categorizer.classify_batch(&items).await;
        assert_eq!(results[0].category, "Furniture");
        assert_eq!(results[1].category, "");
    }
}
