use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::quote::{Quote, QuoteSource};

/// A recorded spot price, as stored in the `silver_price_history` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub id: Uuid,
    pub price_per_oz: f64,
    /// When the price was captured by the feed
    pub recorded_at: DateTime<Utc>,
    pub source: QuoteSource,
    pub created_at: DateTime<Utc>,
}

impl PriceSnapshot {
    pub fn from_quote(quote: &Quote) -> Self {
        Self {
            id: Uuid::new_v4(),
            price_per_oz: quote.price,
            recorded_at: quote.timestamp,
            source: quote.source,
            created_at: Utc::now(),
        }
    }
}
