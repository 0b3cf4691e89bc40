//! The `Offer` type returned by search providers and consumed by the ranker.

use serde::{Deserialize, Serialize};

/// A named link to a merchant carrying a given offer (providers like
/// shopping-aggregators return several merchants per listing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merchant {
    /// Merchant display name.
    pub name: String,
    /// Merchant-specific link, if the provider gave one.
    pub link: Option<String>,
}

/// A single candidate offer returned by a `SearchProvider`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    /// Listing title as returned by the provider.
    pub title: String,
    /// Price in USD; must be `> 0` to be usable.
    pub price: f64,
    /// Domain/retailer label as returned by the provider (may later be
    /// overridden to match the final URL's registrable domain).
    pub source: String,
    /// Direct link to the listing, if the provider gave one.
    pub link: Option<String>,
    /// Alternate merchants carrying this listing.
    pub merchants: Vec<Merchant>,
    /// Provider-supplied product identifier, usable for a secondary lookup.
    pub product_id: Option<String>,
    /// Similarity of this offer's title to the query facts, in `[0, 1]`.
    pub similarity: f64,
}

impl Offer {
    /// Parse a price that may arrive as `"$1,299.00"` style text. Returns
    /// `None` on anything that doesn't reduce to a positive number.
    pub fn parse_price(raw: &str) -> Option<f64> {
        let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
        let value: f64 = cleaned.parse().ok()?;
        if value > 0.0 {
            Some(value)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dollar_and_thousands_separators() {
        assert_eq!(Offer::parse_price("$1,299.00"), Some(1299.0));
        assert_eq!(Offer::parse_price("49.99"), Some(49.99));
    }

    #[test]
    fn rejects_non_positive_or_unparsable() {
        assert_eq!(Offer::parse_price("free"), None);
        assert_eq!(Offer::parse_price("$0.00"), None);
    }
}
