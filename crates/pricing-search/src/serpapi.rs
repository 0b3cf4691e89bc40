//! A [`SearchProvider`] backed by SerpApi's Google Shopping engine — the
//! production shopping-search backend (spec's "uniform adapter over
//! shopping-search engines").

use crate::error::{Error, Result};
use crate::offer::Offer;
use crate::provider::{PriceBand, SearchProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://serpapi.com/search";

/// Credentials/endpoint for the SerpApi backend.
#[derive(Debug, Clone)]
pub struct SerpApiConfig {
    /// SerpApi API key.
    pub api_key: String,
    /// Base URL override, for testing against a local stub.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl SerpApiConfig {
    /// Build a config with the production base URL and a 10s timeout.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), base_url: DEFAULT_BASE_URL.to_string(), timeout: Duration::from_secs(10) }
    }
}

/// Google Shopping search via SerpApi.
pub struct SerpApiProvider {
    client: Client,
    config: SerpApiConfig,
}

impl SerpApiProvider {
    /// Build a provider from `config`.
    pub fn new(config: SerpApiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[derive(Debug, Deserialize)]
struct ShoppingResponse {
    #[serde(default)]
    shopping_results: Vec<ShoppingResult>,
}

#[derive(Debug, Deserialize)]
struct ShoppingResult {
    title: String,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    extracted_price: Option<f64>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    product_link: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    product_id: Option<String>,
}

/// Split a non-2xx SerpApi response into a retryable outage vs. a fatal
/// rejection: 5xx and 429 (rate limit) may clear up on their own, any other
/// 4xx means the request itself is wrong and retrying it is pointless.
fn classify_status_error(status: reqwest::StatusCode) -> Error {
    let code = status.as_u16();
    if status.is_server_error() || code == 429 {
        Error::ProviderDown(format!("serpapi HTTP {status}"))
    } else {
        Error::ProviderRejected(code, format!("serpapi HTTP {status}"))
    }
}

#[async_trait]
impl SearchProvider for SerpApiProvider {
    fn name(&self) -> &str {
        "serpapi"
    }

    async fn search_once(&self, query: &str, price_band: Option<PriceBand>) -> Result<Vec<Offer>> {
        let mut request = self
            .client
            .get(&self.config.base_url)
            .query(&[("engine", "google_shopping"), ("q", query), ("api_key", &self.config.api_key)]);

        if let Some(band) = price_band {
            request = request.query(&[("tbs", format!("price:1,ppr_min:{},ppr_max:{}", band.low, band.high))]);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_status_error(status));
        }

        let parsed: ShoppingResponse =
            serde_json::from_str(&body).map_err(|e| Error::MalformedResponse(e.to_string()))?;

        let offers = parsed
            .shopping_results
            .into_iter()
            .filter_map(|result| {
                let price = result
                    .extracted_price
                    .or_else(|| result.price.as_deref().and_then(Offer::parse_price))?;

                Some(Offer {
                    title: result.title,
                    price,
                    source: result.source.unwrap_or_else(|| "serpapi".to_string()),
                    link: result.product_link.or(result.link),
                    merchants: Vec::new(),
                    product_id: result.product_id,
                    similarity: 1.0,
                })
            })
            .collect();

        Ok(offers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_production_base_url() {
        let config = SerpApiConfig::new("key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn server_errors_and_rate_limit_classify_as_provider_down() {
        assert!(matches!(
            classify_status_error(reqwest::StatusCode::from_u16(503).unwrap()),
            Error::ProviderDown(_)
        ));
        assert!(matches!(
            classify_status_error(reqwest::StatusCode::from_u16(429).unwrap()),
            Error::ProviderDown(_)
        ));
    }

    #[test]
    fn other_client_errors_classify_as_fatal_rejection() {
        assert!(matches!(
            classify_status_error(reqwest::StatusCode::from_u16(400).unwrap()),
            Error::ProviderRejected(400, _)
        ));
        assert!(matches!(
            classify_status_error(reqwest::StatusCode::from_u16(404).unwrap()),
            Error::ProviderRejected(404, _)
        ));
    }

    #[test]
    fn parses_shopping_results_into_offers() {
        let body = r#"{"shopping_results":[
            {"title":"Bissell Vacuum","price":"$89.99","source":"Walmart","product_link":"https://www.walmart.com/ip/123"},
            {"title":"No price item","source":"eBay"}
        ]}"#;
        let parsed: ShoppingResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.shopping_results.len(), 2);
        assert_eq!(parsed.shopping_results[0].price.as_deref(), Some("$89.99"));
    }
}
