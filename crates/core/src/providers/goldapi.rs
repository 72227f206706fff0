use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::payload::parse_spot_text;
use super::traits::SpotPriceProvider;
use crate::errors::CoreError;
use crate::models::quote::{QuoteSource, SpotReading};

pub const BASE_URL: &str = "https://www.goldapi.io/api";

/// GoldAPI provider (`/XAG/USD`).
///
/// - **Requires**: API key, sent in the `x-access-token` header.
/// - **Payload**: flat object with `price`, `prev_close_price`,
///   `open_price`, `low_price`, `high_price`.
/// - No request timeout unless one is configured.
pub struct GoldApiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GoldApiProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_options(api_key, BASE_URL.to_string(), None)
    }

    pub fn with_options(api_key: String, base_url: String, timeout: Option<Duration>) -> Self {
        let builder = Client::builder();
        let builder = match timeout {
            Some(t) => builder.timeout(t),
            None => builder,
        };
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn quote_url(&self) -> String {
        format!("{}/XAG/USD", self.base_url)
    }
}

#[async_trait]
impl SpotPriceProvider for GoldApiProvider {
    fn name(&self) -> &str {
        "goldapi"
    }

    fn source(&self) -> QuoteSource {
        QuoteSource::GoldApi
    }

    async fn fetch_spot(&self) -> Result<SpotReading, CoreError> {
        let url = self.quote_url();
        debug!(provider = self.name(), %url, "requesting silver spot price");

        let body = self
            .client
            .get(&url)
            .header("x-access-token", &self.api_key)
            .header("Accept", "application/json")
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
