use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::payload::parse_spot_text;
use super::traits::SpotPriceProvider;
use crate::errors::CoreError;
use crate::models::quote::{QuoteSource, SpotReading};

pub const BASE_URL: &str = "https://api.metals.dev/v1";

/// Requests slower than this count as failures.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// metals.dev API provider for the silver spot price.
///
/// - **Free tier**: 100 requests/month (no credit card required).
/// - **Requires**: API key, sent as the `api_key` query parameter.
/// - **Payload**: `{ "metals": { "silver": <usd per toz>, .. }, .. }`; only
///   the current price is reported, so reference fields are derived.
pub struct MetalsDevProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl MetalsDevProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_options(api_key, BASE_URL.to_string(), DEFAULT_TIMEOUT)
    }

    pub fn with_options(api_key: String, base_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn latest_url(&self) -> String {
        format!("{}/latest", self.base_url)
    }
}

#[async_trait]
impl SpotPriceProvider for MetalsDevProvider {
    fn name(&self) -> &str {
        "metals.dev"
    }

    fn source(&self) -> QuoteSource {
        QuoteSource::MetalsDev
    }

    async fn fetch_spot(&self) -> Result<SpotReading, CoreError> {
        let url = self.latest_url();
        debug!(provider = self.name(), %url, "requesting silver spot price");

        let body = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("currency", "USD"),
                ("unit", "toz"),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_spot_text(&body).map_err(|e| CoreError::Api {
            provider: self.name().to_string(),
            message: e.to_string(),
        })
    }
}
