use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::quote::{Quote, QuoteSource};
use crate::providers::traits::SpotPriceProvider;

/// Half-width of the uniform band (USD) applied to simulated history points.
pub const HISTORY_VARIATION: f64 = 2.0;

/// Simulated prices never drop below this.
pub const HISTORY_MIN_PRICE: f64 = 0.10;

/// Turns a [`SpotPriceProvider`] into a feed that always has an answer.
///
/// `fetch_quote` never fails: transport errors, bad HTTP status and
/// malformed payloads all produce [`Quote::fallback`]. There is one attempt
/// per call and nothing is cached here.
pub struct PriceFeed {
    provider: Arc<dyn SpotPriceProvider>,
}

impl PriceFeed {
    pub fn new(provider: Arc<dyn SpotPriceProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Current silver quote, or the fallback quote if anything went wrong.
    pub async fn fetch_quote(&self) -> Quote {
        match self.provider.fetch_spot().await {
            Ok(reading) if reading.price.is_finite() && reading.price > 0.0 => {
                let quote = Quote::from_reading(reading, self.provider.source(), Utc::now());
                debug!(provider = self.provider.name(), price = quote.price, "silver quote fetched");
                quote
            }
            Ok(reading) => {
                warn!(
                    provider = self.provider.name(),
                    price = reading.price,
                    "provider returned a non-positive price, using fallback quote"
                );
                Quote::fallback(Utc::now())
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "price fetch failed, using fallback quote");
                Quote::fallback(Utc::now())
            }
        }
    }

    /// Simulated daily history, oldest first, `days + 1` points ending now.
    ///
    /// Not market data: one live (or fallback) quote is perturbed randomly.
    /// Every point is tagged [`QuoteSource::Simulated`].
    pub async fn fetch_history(&self, days: u32) -> Vec<Quote> {
        let seed = self.fetch_quote().await;
        synthetic_history(&seed, days, Utc::now(), &mut rand::thread_rng())
    }
}

/// Generate `days + 1` simulated quotes around `seed.price`, oldest first,
/// one day apart and ending at `end`.
///
/// Each price is `seed ± U(-2, 2)`, clamped to at least 0.10 and rounded to
/// cents. Pass a seeded RNG for repeatable output.
pub fn synthetic_history<R: Rng + ?Sized>(
    seed: &Quote,
    days: u32,
    end: DateTime<Utc>,
    rng: &mut R,
) -> Vec<Quote> {
    (0..=days)
        .rev()
        .map(|days_back| {
            let variation = rng.gen_range(-HISTORY_VARIATION..=HISTORY_VARIATION);
            let price = (seed.price + variation).max(HISTORY_MIN_PRICE);
            let price = (price * 100.0).round() / 100.0;
            Quote {
                price,
                previous_close: Some(price - 0.10),
                open: price + 0.05,
                high: price + 0.30,
                low: price - 0.20,
                timestamp: end - Duration::days(i64::from(days_back)),
                source: QuoteSource::Simulated,
            }
        })
        .collect()
}
