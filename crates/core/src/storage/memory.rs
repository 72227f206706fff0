use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::traits::{HoldingStore, StoreOutcome, HOLDINGS_COLLECTION, PRICE_HISTORY_COLLECTION};
use crate::errors::CoreError;
use crate::models::holding::Holding;
use crate::models::price::PriceSnapshot;

#[derive(Default)]
struct Tables {
    holdings: Vec<Holding>,
    price_history: Vec<PriceSnapshot>,
}

/// In-process store with the same contract as the HTTP backend.
///
/// Used offline and in tests. `set_unavailable(true)` makes every call
/// fail, which is how tests exercise the failure path.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn holding_count(&self) -> usize {
        self.tables
            .lock()
            .map(|t| t.holdings.len())
            .unwrap_or(0)
    }

    fn tables(&self, collection: &str) -> Result<MutexGuard<'_, Tables>, CoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CoreError::Persistence {
                collection: collection.to_string(),
                message: "store unavailable".into(),
            });
        }
        self.tables.lock().map_err(|_| CoreError::Persistence {
            collection: collection.to_string(),
            message: "store lock poisoned".into(),
        })
    }
}

#[async_trait]
impl HoldingStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert_holding(&self, holding: &Holding) -> StoreOutcome<Holding> {
        let mut tables = match self.tables(HOLDINGS_COLLECTION) {
            Ok(t) => t,
            Err(e) => return StoreOutcome::Failed(e),
        };
        if tables.holdings.iter().any(|h| h.id == holding.id) {
            return StoreOutcome::Failed(CoreError::Persistence {
                collection: HOLDINGS_COLLECTION.into(),
                message: format!("duplicate id {}", holding.id),
            });
        }
        tables.holdings.push(holding.clone());
        StoreOutcome::Success(holding.clone())
    }

    async fn list_holdings(&self) -> StoreOutcome<Vec<Holding>> {
        match self.tables(HOLDINGS_COLLECTION) {
            Ok(tables) => {
                let mut rows = tables.holdings.clone();
                rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                StoreOutcome::from_rows(rows)
            }
            Err(e) => StoreOutcome::Failed(e),
        }
    }

    async fn delete_holding(&self, id: Uuid) -> StoreOutcome<()> {
        let mut tables = match self.tables(HOLDINGS_COLLECTION) {
            Ok(t) => t,
            Err(e) => return StoreOutcome::Failed(e),
        };
        let before = tables.holdings.len();
        tables.holdings.retain(|h| h.id != id);
        if tables.holdings.len() < before {
            StoreOutcome::Success(())
        } else {
            StoreOutcome::Empty
        }
    }

    async fn insert_price_snapshot(&self, snapshot: &PriceSnapshot) -> StoreOutcome<PriceSnapshot> {
        match self.tables(PRICE_HISTORY_COLLECTION) {
            Ok(mut tables) => {
                tables.price_history.push(snapshot.clone());
                StoreOutcome::Success(snapshot.clone())
            }
            Err(e) => StoreOutcome::Failed(e),
        }
    }

    async fn price_history_since(&self, since: DateTime<Utc>) -> StoreOutcome<Vec<PriceSnapshot>> {
        match self.tables(PRICE_HISTORY_COLLECTION) {
            Ok(tables) => {
                let mut rows: Vec<PriceSnapshot> = tables
                    .price_history
                    .iter()
                    .filter(|s| s.recorded_at >= since)
                    .cloned()
                    .collect();
                rows.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
                StoreOutcome::from_rows(rows)
            }
            Err(e) => StoreOutcome::Failed(e),
        }
    }
}
