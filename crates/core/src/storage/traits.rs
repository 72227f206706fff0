use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::holding::Holding;
use crate::models::price::PriceSnapshot;

/// Table holding one row per purchased item.
pub const HOLDINGS_COLLECTION: &str = "silver_assets";

/// Table holding recorded spot prices.
pub const PRICE_HISTORY_COLLECTION: &str = "silver_price_history";

/// Result of a store operation.
///
/// Keeps "nothing there" apart from "could not ask": callers must not read
/// a failed list as an empty portfolio.
#[derive(Debug)]
pub enum StoreOutcome<T> {
    Success(T),
    /// The backend answered, but had no matching record.
    Empty,
    Failed(CoreError),
}

impl<U> StoreOutcome<Vec<U>> {
    /// `Success` for a non-empty list, `Empty` otherwise.
    pub fn from_rows(rows: Vec<U>) -> Self {
        if rows.is_empty() {
            StoreOutcome::Empty
        } else {
            StoreOutcome::Success(rows)
        }
    }
}

impl<T> StoreOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, StoreOutcome::Success(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, StoreOutcome::Empty)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StoreOutcome::Failed(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> StoreOutcome<U> {
        match self {
            StoreOutcome::Success(v) => StoreOutcome::Success(f(v)),
            StoreOutcome::Empty => StoreOutcome::Empty,
            StoreOutcome::Failed(e) => StoreOutcome::Failed(e),
        }
    }

    /// `Ok(Some(_))` on success, `Ok(None)` when empty, `Err` on failure.
    pub fn into_result(self) -> Result<Option<T>, CoreError> {
        match self {
            StoreOutcome::Success(v) => Ok(Some(v)),
            StoreOutcome::Empty => Ok(None),
            StoreOutcome::Failed(e) => Err(e),
        }
    }
}

/// Persistence boundary for holdings and price history.
///
/// Implementations never panic and never return a bare error: every call
/// ends in a [`StoreOutcome`].
#[async_trait]
pub trait HoldingStore: Send + Sync {
    fn name(&self) -> &str;

    /// Insert one holding and return the record as stored.
    async fn insert_holding(&self, holding: &Holding) -> StoreOutcome<Holding>;

    /// All holdings, newest `created_at` first.
    async fn list_holdings(&self) -> StoreOutcome<Vec<Holding>>;

    /// Delete by id. `Empty` when no row matched.
    async fn delete_holding(&self, id: Uuid) -> StoreOutcome<()>;

    async fn insert_price_snapshot(&self, snapshot: &PriceSnapshot) -> StoreOutcome<PriceSnapshot>;

    /// Snapshots recorded at or after `since`, newest first.
    async fn price_history_since(&self, since: DateTime<Utc>) -> StoreOutcome<Vec<PriceSnapshot>>;
}
