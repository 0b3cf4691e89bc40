//! Trust classification for retailer domains and URL shapes.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Trust tier assigned to a source domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrustTier {
    /// A known, reputable retailer.
    Trusted,
    /// A marketplace/reseller pattern known to produce unverifiable offers.
    Untrusted,
    /// Neither confirmed trusted nor known-bad; usable for ranking only.
    Unknown,
}

/// Data-driven trust policy: domain sets and blocked URL-shape substrings.
///
/// Kept as configuration rather than code branches per the design notes —
/// callers inject their own retailer list instead of us hard-coding one.
#[derive(Debug, Clone)]
pub struct TrustPolicy {
    trusted_domains: HashSet<String>,
    untrusted_patterns: Vec<String>,
    blocked_url_patterns: Vec<String>,
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TrustPolicy {
    /// Construct an empty policy; callers add domains/patterns themselves.
    pub fn new() -> Self {
        Self {
            trusted_domains: HashSet::new(),
            untrusted_patterns: Vec::new(),
            blocked_url_patterns: Vec::new(),
        }
    }

    /// A policy pre-populated with a reasonable default retailer set.
    pub fn with_defaults() -> Self {
        let trusted = [
            "walmart.com",
            "target.com",
            "amazon.com",
            "lowes.com",
            "homedepot.com",
            "bestbuy.com",
            "wayfair.com",
            "costco.com",
            "overstock.com",
            "kohls.com",
            "containerstore.com",
            "michaels.com",
            "hobbylobby.com",
            "acehardware.com",
        ];
        let untrusted = [
            "ebay.com",
            "etsy.com",
            "craigslist.org",
            "aliexpress.com",
            "dhgate.com",
            "temu.com",
            "wish.com",
            "trading",
            "co.ltd",
            "wholesale",
            "dropship",
            "seller",
            "marketplace",
        ];
        let blocked = [
            "/search?",
            "/s?",
            "facebook.com",
            "instagram.com",
            "twitter.com",
            "x.com",
            "unavailable",
            "error",
            "not-found",
            "404",
            "out-of-stock",
            "sorry",
        ];
        Self {
            trusted_domains: trusted.iter().map(|s| s.to_string()).collect(),
            untrusted_patterns: untrusted.iter().map(|s| s.to_string()).collect(),
            blocked_url_patterns: blocked.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Register an additional trusted domain.
    pub fn with_trusted_domain(mut self, domain: impl Into<String>) -> Self {
        self.trusted_domains.insert(domain.into().to_lowercase());
        self
    }

    /// Register an additional untrusted substring pattern.
    pub fn with_untrusted_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.untrusted_patterns.push(pattern.into().to_lowercase());
        self
    }

    /// Register an additional blocked URL-shape substring.
    pub fn with_blocked_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.blocked_url_patterns.push(pattern.into().to_lowercase());
        self
    }

    /// Classify a bare source label or hostname.
    pub fn classify_source(&self, source: &str) -> TrustTier {
        let lower = source.to_lowercase();
        if self
            .trusted_domains
            .iter()
            .any(|d| lower == *d || lower.ends_with(&format!(".{d}")) || lower.contains(d))
        {
            return TrustTier::Trusted;
        }
        if self.untrusted_patterns.iter().any(|p| lower.contains(p)) {
            return TrustTier::Untrusted;
        }
        TrustTier::Unknown
    }

    /// Whether a URL matches one of the blocked shapes (search-result pages,
    /// social media, error/out-of-stock pages).
    pub fn is_blocked_url(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        self.blocked_url_patterns.iter().any(|p| lower.contains(p))
    }

    /// The registrable domain of a URL, if it can be extracted.
    pub fn registrable_domain(&self, url: &str) -> Option<String> {
        let without_scheme = url.split("://").nth(1).unwrap_or(url);
        let host = without_scheme.split(['/', '?', '#']).next()?;
        let host = host.split('@').next_back().unwrap_or(host);
        let host = host.split(':').next().unwrap_or(host);
        if host.is_empty() {
            return None;
        }
        Some(host.to_lowercase())
    }

    /// Whether a URL's registrable domain is in the trusted set.
    pub fn is_trusted_url(&self, url: &str) -> bool {
        self.registrable_domain(url)
            .map(|d| self.classify_source(&d) == TrustTier::Trusted)
            .unwrap_or(false)
    }

    /// A human-friendly retailer name for a trusted domain, used to
    /// override provider-supplied source labels (spec: source must agree
    /// with the final URL's registrable domain).
    pub fn friendly_name(&self, url: &str) -> Option<String> {
        let domain = self.registrable_domain(url)?;
        let base = domain.strip_prefix("www.").unwrap_or(&domain);
        let name = base.split('.').next().unwrap_or(base);
        let mut chars = name.chars();
        let capitalized = match chars.next() {
            Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
            None => return None,
        };
        Some(capitalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_trusted_domain() {
        let policy = TrustPolicy::with_defaults();
        assert_eq!(policy.classify_source("www.walmart.com"), TrustTier::Trusted);
    }

    #[test]
    fn classifies_untrusted_marketplace() {
        let policy = TrustPolicy::with_defaults();
        assert_eq!(policy.classify_source("ebay.com"), TrustTier::Untrusted);
        assert_eq!(
            policy.classify_source("shenzhen-wholesale-traders.com"),
            TrustTier::Untrusted
        );
    }

    #[test]
    fn unknown_source_is_neither() {
        let policy = TrustPolicy::with_defaults();
        assert_eq!(policy.classify_source("somelocalshop.example"), TrustTier::Unknown);
    }

    #[test]
    fn blocks_search_result_and_error_pages() {
        let policy = TrustPolicy::with_defaults();
        assert!(policy.is_blocked_url("https://www.google.com/search?q=iron"));
        assert!(policy.is_blocked_url("https://shop.com/item/out-of-stock"));
        assert!(!policy.is_blocked_url("https://www.walmart.com/ip/12345"));
    }

    #[test]
    fn registrable_domain_strips_scheme_path_and_port() {
        let policy = TrustPolicy::with_defaults();
        assert_eq!(
            policy.registrable_domain("https://www.walmart.com:443/ip/123?x=1"),
            Some("www.walmart.com".to_string())
        );
    }

    #[test]
    fn friendly_name_capitalizes_base_domain() {
        let policy = TrustPolicy::with_defaults();
        assert_eq!(
            policy.friendly_name("https://www.walmart.com/ip/123"),
            Some("Walmart".to_string())
        );
    }
}
