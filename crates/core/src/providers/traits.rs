use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::quote::{QuoteSource, SpotReading};

/// Trait abstraction for silver spot-price integrations.
///
/// Each market-data API (metals.dev, GoldAPI) implements this trait. The
/// integrations disagree on URL, auth and payload shape; all of that stays
/// inside the implementation. Errors are returned as-is: turning them into
/// a fallback quote is the job of [`crate::services::price_feed::PriceFeed`].
#[async_trait]
pub trait SpotPriceProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Provenance tag stamped on quotes built from this provider's readings.
    fn source(&self) -> QuoteSource;

    /// Fetch the current XAG/USD price per troy ounce. One attempt, no retry.
    async fn fetch_spot(&self) -> Result<SpotReading, CoreError>;
}
