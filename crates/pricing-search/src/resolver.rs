//! URLResolver: catalog/search URLs -> direct product URLs.

use crate::trust::TrustPolicy;
use std::time::Duration;

const CATALOG_PATTERNS: &[&str] = &["/s/", "/search", "/category", "?q=", "&q=", "/browse", "/catalog"];
const DIRECT_PATTERNS: &[&str] = &[
    "/ip/", "/dp/", "/p/", "/pd/", "/site/", "/pdp/", "/product/", "/products/", "/item/", "/listing/",
];
const MAX_REDIRECTS: usize = 5;
const RESOLVE_BUDGET: Duration = Duration::from_secs(8);

/// Resolves catalog/search-listing URLs to direct-product URLs, following
/// a bounded number of HTTP redirects within an overall time budget.
pub struct UrlResolver {
    client: reqwest::Client,
}

impl UrlResolver {
    /// Build a resolver with a redirect policy capped at [`MAX_REDIRECTS`].
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(RESOLVE_BUDGET)
            .build()
            .expect("resolver http client");
        Self { client }
    }

    /// Whether `url` looks like a catalog/search listing page rather than a
    /// single product.
    pub fn is_catalog_url(url: &str) -> bool {
        let lower = url.to_lowercase();
        CATALOG_PATTERNS.iter().any(|p| lower.contains(p))
            || (lower.contains("/products") && !Self::is_direct_product_url(url))
    }

    /// Whether `url` matches a known direct-product URL shape.
    pub fn is_direct_product_url(url: &str) -> bool {
        let lower = url.to_lowercase();
        DIRECT_PATTERNS.iter().any(|p| lower.contains(p))
    }

    /// Resolve `url` to a direct-product URL when possible. Idempotent: a
    /// URL that is already direct is returned unchanged without a network
    /// call. On failure to resolve, the original URL is returned.
    pub async fn resolve(&self, url: &str, trust: &TrustPolicy) -> String {
        if Self::is_direct_product_url(url) {
            return url.to_string();
        }
        if !Self::is_catalog_url(url) {
            return url.to_string();
        }
        match self.client.get(url).send().await {
            Ok(resp) => {
                let final_url = resp.url().to_string();
                if Self::is_direct_product_url(&final_url) && trust.is_trusted_url(&final_url) {
                    final_url
                } else {
                    url.to_string()
                }
            }
            Err(err) => {
                tracing::debug!(url, error = %err, "url_resolve_failed");
                url.to_string()
            }
        }
    }
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_direct_product_patterns() {
        assert!(UrlResolver::is_direct_product_url("https://www.walmart.com/ip/123456"));
        assert!(UrlResolver::is_direct_product_url("https://www.target.com/p/A-789"));
        assert!(!UrlResolver::is_direct_product_url("https://www.target.com/s/vacuum"));
    }

    #[test]
    fn recognizes_catalog_urls() {
        assert!(UrlResolver::is_catalog_url("https://www.walmart.com/search?q=vacuum"));
        assert!(UrlResolver::is_catalog_url("https://www.example.com/category/vacuums"));
        assert!(!UrlResolver::is_catalog_url("https://www.walmart.com/ip/123456"));
    }

    #[tokio::test]
    async fn idempotent_on_already_direct_url() {
        let resolver = UrlResolver::new();
        let trust = TrustPolicy::with_defaults();
        let url = "https://www.walmart.com/ip/123456";
        assert_eq!(resolver.resolve(url, &trust).await, url);
    }
}
