use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::traits::{HoldingStore, StoreOutcome, HOLDINGS_COLLECTION, PRICE_HISTORY_COLLECTION};
use crate::errors::CoreError;
use crate::models::holding::Holding;
use crate::models::price::PriceSnapshot;
use crate::models::settings::StoreSettings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Store backed by a PostgREST endpoint (Supabase `rest/v1`).
///
/// Auth is the project's anon key, sent both as `apikey` and as a bearer
/// token. Writes ask for `return=representation` so the stored row comes back.
pub struct PostgrestStore {
    client: Client,
    rest_url: String,
    anon_key: String,
}

impl PostgrestStore {
    pub fn new(settings: &StoreSettings) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            rest_url: format!("{}/rest/v1", settings.url.trim_end_matches('/')),
            anon_key: settings.anon_key.clone(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{collection}", self.rest_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Accept", "application/json")
    }

    /// Send a request and decode the JSON array of rows it returns.
    async fn rows<T: DeserializeOwned>(
        &self,
        collection: &str,
        request: RequestBuilder,
    ) -> Result<Vec<T>, CoreError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CoreError::Persistence {
                collection: collection.to_string(),
                message: format!("HTTP {status}: {body}"),
            });
        }
        serde_json::from_str(&body).map_err(|e| CoreError::Persistence {
            collection: collection.to_string(),
            message: format!("unexpected response body: {e}"),
        })
    }

    fn outcome<T>(&self, collection: &str, op: &str, result: Result<T, CoreError>) -> StoreOutcome<T>
    where
        T: RowsLen,
    {
        match result {
            Ok(rows) if rows.rows_len() == 0 => {
                debug!(collection, op, "store returned no rows");
                StoreOutcome::Empty
            }
            Ok(rows) => StoreOutcome::Success(rows),
            Err(e) => {
                warn!(collection, op, error = %e, "store request failed");
                StoreOutcome::Failed(e)
            }
        }
    }
}

/// Row count, so list and single-row operations share the empty check.
trait RowsLen {
    fn rows_len(&self) -> usize;
}

impl<T> RowsLen for Vec<T> {
    fn rows_len(&self) -> usize {
        self.len()
    }
}

#[async_trait]
impl HoldingStore for PostgrestStore {
    fn name(&self) -> &str {
        "postgrest"
    }

    async fn insert_holding(&self, holding: &Holding) -> StoreOutcome<Holding> {
        let request = self
            .client
            .post(self.collection_url(HOLDINGS_COLLECTION))
            .header("Prefer", "return=representation")
            .json(holding);
        let result = self.rows::<Holding>(HOLDINGS_COLLECTION, request).await;
        self.outcome(HOLDINGS_COLLECTION, "insert", result)
            .map(|mut rows| rows.remove(0))
    }

    async fn list_holdings(&self) -> StoreOutcome<Vec<Holding>> {
        let request = self
            .client
            .get(self.collection_url(HOLDINGS_COLLECTION))
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let result = self.rows(HOLDINGS_COLLECTION, request).await;
        self.outcome(HOLDINGS_COLLECTION, "list", result)
    }

    async fn delete_holding(&self, id: Uuid) -> StoreOutcome<()> {
        let request = self
            .client
            .delete(self.collection_url(HOLDINGS_COLLECTION))
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{id}"))]);
        let result = self.rows::<Holding>(HOLDINGS_COLLECTION, request).await;
        self.outcome(HOLDINGS_COLLECTION, "delete", result).map(|_| ())
    }

    async fn insert_price_snapshot(&self, snapshot: &PriceSnapshot) -> StoreOutcome<PriceSnapshot> {
        let request = self
            .client
            .post(self.collection_url(PRICE_HISTORY_COLLECTION))
            .header("Prefer", "return=representation")
            .json(snapshot);
        let result = self.rows::<PriceSnapshot>(PRICE_HISTORY_COLLECTION, request).await;
        self.outcome(PRICE_HISTORY_COLLECTION, "insert", result)
            .map(|mut rows| rows.remove(0))
    }

    async fn price_history_since(&self, since: DateTime<Utc>) -> StoreOutcome<Vec<PriceSnapshot>> {
        let since = since.to_rfc3339_opts(SecondsFormat::Millis, true);
        let request = self
            .client
            .get(self.collection_url(PRICE_HISTORY_COLLECTION))
            .query(&[
                ("select", "*".to_string()),
                ("recorded_at", format!("gte.{since}")),
                ("order", "recorded_at.desc".to_string()),
            ]);
        let result = self.rows(PRICE_HISTORY_COLLECTION, request).await;
        self.outcome(PRICE_HISTORY_COLLECTION, "history", result)
    }
}
