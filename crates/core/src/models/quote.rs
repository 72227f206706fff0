use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Spot price used when the provider cannot be reached or answers garbage.
pub const FALLBACK_PRICE: f64 = 31.25;

/// Offsets used to derive reference fields when a provider only reports
/// the current price. These are approximations, not market data.
pub const PREV_CLOSE_OFFSET: f64 = -0.50;
pub const OPEN_OFFSET: f64 = 0.15;
pub const LOW_OFFSET: f64 = -0.80;
pub const HIGH_OFFSET: f64 = 0.60;

/// Where a quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteSource {
    /// metals.dev `/latest` endpoint
    MetalsDev,
    /// GoldAPI-style flat payload
    GoldApi,
    /// Synthetic point generated by the history helper
    Simulated,
    /// Hardcoded quote substituted after a failed fetch
    Fallback,
}

impl std::fmt::Display for QuoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteSource::MetalsDev => write!(f, "metals.dev"),
            QuoteSource::GoldApi => write!(f, "goldapi"),
            QuoteSource::Simulated => write!(f, "simulated"),
            QuoteSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// What a provider actually reported. Only `price` is mandatory; the
/// reference fields are filled in by [`Quote::from_reading`] when absent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpotReading {
    pub price: f64,
    pub previous_close: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
}

impl SpotReading {
    pub fn price_only(price: f64) -> Self {
        Self {
            price,
            ..Self::default()
        }
    }
}

/// A single silver market snapshot, USD per troy ounce.
///
/// Immutable once built. Every refresh replaces the previous quote wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,

    /// `None` (or a non-positive value) means the previous close is unknown.
    pub previous_close: Option<f64>,

    pub open: f64,
    pub high: f64,
    pub low: f64,

    /// Instant the quote was captured
    pub timestamp: DateTime<Utc>,

    pub source: QuoteSource,
}

impl Quote {
    /// Build a quote from a bare price, deriving the reference fields
    /// from the fixed offsets.
    pub fn from_price(price: f64, source: QuoteSource, timestamp: DateTime<Utc>) -> Self {
        Self::from_reading(SpotReading::price_only(price), source, timestamp)
    }

    /// Normalize a provider reading. Reference fields the provider did not
    /// supply are derived from the price with the fixed offsets.
    pub fn from_reading(reading: SpotReading, source: QuoteSource, timestamp: DateTime<Utc>) -> Self {
        let price = reading.price;
        Self {
            price,
            previous_close: Some(reading.previous_close.unwrap_or(price + PREV_CLOSE_OFFSET)),
            open: reading.open.unwrap_or(price + OPEN_OFFSET),
            high: reading.high.unwrap_or(price + HIGH_OFFSET),
            low: reading.low.unwrap_or(price + LOW_OFFSET),
            timestamp,
            source,
        }
    }

    /// The fixed quote used whenever the feed fails.
    pub fn fallback(timestamp: DateTime<Utc>) -> Self {
        Self::from_price(FALLBACK_PRICE, QuoteSource::Fallback, timestamp)
    }

    pub fn is_fallback(&self) -> bool {
        self.source == QuoteSource::Fallback
    }

    /// Previous close, only when it is a usable positive number.
    pub fn known_previous_close(&self) -> Option<f64> {
        self.previous_close.filter(|p| p.is_finite() && *p > 0.0)
    }

    /// Percentage change against the previous close, if it is known.
    pub fn change_pct(&self) -> Option<f64> {
        self.known_previous_close()
            .map(|prev| (self.price - prev) / prev * 100.0)
    }
}
