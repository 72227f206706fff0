pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use errors::CoreError;
use models::{
    analytics::{HoldingSummary, PortfolioSummary},
    form::{FormProblem, HoldingForm},
    holding::Holding,
    portfolio::Portfolio,
    price::PriceSnapshot,
    quote::Quote,
    settings::Settings,
};
use providers::registry::PriceProviderRegistry;
use services::{
    portfolio_service::PortfolioService, price_feed::PriceFeed,
    valuation_service::ValuationService,
};
use storage::{
    postgrest::PostgrestStore,
    traits::{HoldingStore, StoreOutcome, HOLDINGS_COLLECTION},
};

/// Which kind of price load is running. Each kind has its own busy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadKind {
    /// First load / full-screen spinner
    Initial,
    /// Timer tick or manual refresh button
    Background,
    /// Timer tick of the given schedule; discarded unless that schedule
    /// is still the active one
    Scheduled(u64),
}

/// Everything the presentation layer renders.
#[derive(Debug)]
struct TrackerState {
    portfolio: Portfolio,
    form: HoldingForm,
    /// In-flight loads per kind. Flags read as "busy" while non-zero so an
    /// overlapping load finishing first does not clear the other's flag.
    loading: u32,
    refreshing: u32,
    last_updated: Option<DateTime<Utc>>,
    weekly_change: f64,
    /// Generation of the running refresh schedule, if any. Bumped on every
    /// `start` so ticks from an older schedule never apply.
    active_schedule: Option<u64>,
    schedule_generation: u64,
}

impl TrackerState {
    fn new() -> Self {
        Self {
            portfolio: Portfolio::default(),
            form: HoldingForm::empty(Utc::now().date_naive()),
            loading: 0,
            refreshing: 0,
            last_updated: None,
            weekly_change: 0.0,
            active_schedule: None,
            schedule_generation: 0,
        }
    }

    fn counter(&mut self, kind: LoadKind) -> &mut u32 {
        match kind {
            LoadKind::Initial => &mut self.loading,
            LoadKind::Background | LoadKind::Scheduled(_) => &mut self.refreshing,
        }
    }
}

fn lock(state: &Mutex<TrackerState>) -> MutexGuard<'_, TrackerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Raises a busy flag on creation and lowers it on drop, so the flag is
/// cleared even if the load is cancelled or unwinds.
struct LoadGuard {
    state: Weak<Mutex<TrackerState>>,
    kind: LoadKind,
}

impl LoadGuard {
    fn begin(state: &Arc<Mutex<TrackerState>>, kind: LoadKind) -> Self {
        *lock(state).counter(kind) += 1;
        Self {
            state: Arc::downgrade(state),
            kind,
        }
    }
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            let mut state = lock(&state);
            let counter = state.counter(self.kind);
            *counter = counter.saturating_sub(1);
        }
    }
}

/// What a price load needs, cloneable into the refresh task.
#[derive(Clone)]
struct QuoteLoader {
    feed: Arc<PriceFeed>,
    store: Option<Arc<dyn HoldingStore>>,
    record_history: bool,
}

impl QuoteLoader {
    /// Fetch a quote and store it in `state` if the tracker still exists.
    ///
    /// Never fails: the feed substitutes the fallback quote on error.
    async fn load(&self, state: &Weak<Mutex<TrackerState>>, kind: LoadKind) -> Quote {
        let guard = state.upgrade().map(|s| LoadGuard::begin(&s, kind));

        let quote = self.feed.fetch_quote().await;

        let applied = match state.upgrade() {
            Some(state) => {
                let weekly_change =
                    ValuationService::new().weekly_change(&quote, &mut rand::thread_rng());
                let mut state = lock(&state);
                let stale_tick = match kind {
                    LoadKind::Scheduled(generation) => state.active_schedule != Some(generation),
                    _ => false,
                };
                if stale_tick {
                    false
                } else {
                    state.portfolio.quote = Some(quote.clone());
                    state.last_updated = Some(Utc::now());
                    state.weekly_change = weekly_change;
                    true
                }
            }
            None => false,
        };
        drop(guard);

        if !applied {
            debug!(price = quote.price, "tracker gone or schedule replaced, discarding loaded quote");
            return quote;
        }
        debug!(price = quote.price, source = %quote.source, ?kind, "silver quote loaded");

        if self.record_history && !quote.is_fallback() {
            if let Some(store) = &self.store {
                if let StoreOutcome::Failed(e) =
                    store.insert_price_snapshot(&PriceSnapshot::from_quote(&quote)).await
                {
                    warn!(error = %e, "could not record price snapshot");
                }
            }
        }

        quote
    }
}

/// Main entry point for the Silver Tracker core library.
///
/// View model over the holdings list and the latest silver quote. Owns the
/// periodic refresh task and the add-item workflow. Derived figures are
/// recomputed on every call to [`SilverTracker::summary`].
#[must_use]
pub struct SilverTracker {
    settings: Settings,
    loader: QuoteLoader,
    state: Arc<Mutex<TrackerState>>,
    portfolio_service: PortfolioService,
    valuation_service: ValuationService,
    refresh_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SilverTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("SilverTracker")
            .field("provider", &self.loader.feed.provider_name())
            .field("store", &self.loader.store.as_ref().map(|s| s.name().to_string()))
            .field("holdings", &state.portfolio.holdings.len())
            .field("quote", &state.portfolio.quote.as_ref().map(|q| q.price))
            .field("refresh_running", &self.refresh_task.is_some())
            .finish()
    }
}

impl SilverTracker {
    /// Build a tracker from settings: selects the price provider and, when
    /// configured, connects the PostgREST store.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        let registry = PriceProviderRegistry::new_with_defaults(&settings);
        let feed = PriceFeed::new(registry.select(&settings)?);
        let store = settings
            .store
            .as_ref()
            .map(|s| Arc::new(PostgrestStore::new(s)) as Arc<dyn HoldingStore>);
        Ok(Self::with_parts(settings, feed, store))
    }

    /// Build a tracker from already-constructed collaborators.
    pub fn with_parts(
        settings: Settings,
        feed: PriceFeed,
        store: Option<Arc<dyn HoldingStore>>,
    ) -> Self {
        let loader = QuoteLoader {
            feed: Arc::new(feed),
            store,
            record_history: settings.record_price_history,
        };
        Self {
            settings,
            loader,
            state: Arc::new(Mutex::new(TrackerState::new())),
            portfolio_service: PortfolioService::new(),
            valuation_service: ValuationService::new(),
            refresh_task: None,
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Load the first quote, then refresh every `refresh_interval` in the
    /// background until [`SilverTracker::shutdown`] (or drop).
    ///
    /// Calling `start` on a running tracker does nothing.
    pub async fn start(&mut self) {
        if self.refresh_task.is_some() {
            return;
        }
        self.load_with(LoadKind::Initial).await;

        let period = self.settings.refresh_interval();
        let loader = self.loader.clone();
        let state = Arc::downgrade(&self.state);
        let generation = {
            let mut state = lock(&self.state);
            state.schedule_generation += 1;
            state.active_schedule = Some(state.schedule_generation);
            state.schedule_generation
        };

        self.refresh_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if state.strong_count() == 0 {
                    break;
                }
                // Each tick runs on its own task: a slow fetch does not hold
                // back the next tick, and the later finisher wins.
                let loader = loader.clone();
                let state = state.clone();
                tokio::spawn(async move {
                    loader.load(&state, LoadKind::Scheduled(generation)).await;
                });
            }
        }));
        info!(interval_secs = period.as_secs(), "silver price refresh scheduled");
    }

    /// Cancel the refresh schedule. Scheduled fetches still in flight
    /// complete, but their results are dropped.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
            lock(&self.state).active_schedule = None;
            info!("silver price refresh stopped");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.refresh_task.is_some()
    }

    // ── Prices ──────────────────────────────────────────────────────

    /// Fetch a quote and make it current. Raises the loading flag, or the
    /// refreshing flag when `background` is set, for the duration.
    pub async fn load_quote(&self, background: bool) -> Quote {
        let kind = if background {
            LoadKind::Background
        } else {
            LoadKind::Initial
        };
        self.load_with(kind).await
    }

    /// Manual refresh (the refresh button): a background load.
    pub async fn refresh(&self) -> Quote {
        self.load_with(LoadKind::Background).await
    }

    async fn load_with(&self, kind: LoadKind) -> Quote {
        self.loader.load(&Arc::downgrade(&self.state), kind).await
    }

    /// Simulated daily history around the current price. Not market data.
    pub async fn fetch_history(&self, days: u32) -> Vec<Quote> {
        self.loader.feed.fetch_history(days).await
    }

    #[must_use]
    pub fn quote(&self) -> Option<Quote> {
        lock(&self.state).portfolio.quote.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        lock(&self.state).loading > 0
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        lock(&self.state).refreshing > 0
    }

    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        lock(&self.state).last_updated
    }

    /// Change against the previous close, in percent. A random placeholder
    /// when the quote had no usable previous close.
    #[must_use]
    pub fn weekly_change(&self) -> f64 {
        lock(&self.state).weekly_change
    }

    /// True when no quote was loaded yet or the last one is older than `max_age`.
    #[must_use]
    pub fn is_stale(&self, max_age: chrono::Duration) -> bool {
        match self.last_updated() {
            Some(at) => Utc::now() - at > max_age,
            None => true,
        }
    }

    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.loader.feed.provider_name()
    }

    // ── Holdings & Value ────────────────────────────────────────────

    #[must_use]
    pub fn holdings(&self) -> Vec<Holding> {
        lock(&self.state).portfolio.holdings.clone()
    }

    #[must_use]
    pub fn holding(&self, id: Uuid) -> Option<Holding> {
        let state = lock(&self.state);
        self.portfolio_service
            .get_holding(&state.portfolio, id)
            .cloned()
    }

    #[must_use]
    pub fn holding_count(&self) -> usize {
        lock(&self.state).portfolio.holdings.len()
    }

    /// All derived figures at the current quote.
    #[must_use]
    pub fn summary(&self) -> PortfolioSummary {
        let state = lock(&self.state);
        self.valuation_service
            .summarize(&state.portfolio.holdings, state.portfolio.quote.as_ref())
    }

    #[must_use]
    pub fn holding_summary(&self, id: Uuid) -> Option<HoldingSummary> {
        let state = lock(&self.state);
        let spot = state.portfolio.quote.as_ref().map(|q| q.price).unwrap_or(0.0);
        self.portfolio_service
            .get_holding(&state.portfolio, id)
            .map(|h| self.valuation_service.summarize_holding(h, spot))
    }

    /// Validate `form`, convert its weight to troy ounces and append the
    /// new holding. With a store attached the holding is persisted first;
    /// nothing is appended if that fails.
    pub async fn add_holding(&self, form: &HoldingForm) -> Result<Holding, CoreError> {
        let holding = self.portfolio_service.create_holding(form)?;

        let holding = match &self.loader.store {
            Some(store) => match store.insert_holding(&holding).await {
                StoreOutcome::Success(stored) => stored,
                StoreOutcome::Empty => {
                    return Err(CoreError::Persistence {
                        collection: HOLDINGS_COLLECTION.into(),
                        message: "insert returned no record".into(),
                    })
                }
                StoreOutcome::Failed(e) => return Err(e),
            },
            None => holding,
        };

        self.portfolio_service
            .add_holding(&mut lock(&self.state).portfolio, holding.clone())?;
        info!(id = %holding.id, name = %holding.name, weight_oz = holding.silver_weight_oz, "holding added");
        Ok(holding)
    }

    /// Delete a holding (from the store first, when attached).
    pub async fn remove_holding(&self, id: Uuid) -> Result<Holding, CoreError> {
        if self.holding(id).is_none() {
            return Err(CoreError::HoldingNotFound(id.to_string()));
        }
        if let Some(store) = &self.loader.store {
            match store.delete_holding(id).await {
                StoreOutcome::Success(()) => {}
                StoreOutcome::Empty => warn!(%id, "holding was not in the store, removing locally"),
                StoreOutcome::Failed(e) => return Err(e),
            }
        }
        let removed = self
            .portfolio_service
            .remove_holding(&mut lock(&self.state).portfolio, id)?;
        info!(%id, "holding removed");
        Ok(removed)
    }

    /// Replace the local holdings with the store's. Returns how many were loaded.
    ///
    /// An empty store clears the list; a failed read leaves it untouched.
    pub async fn sync_holdings(&self) -> Result<usize, CoreError> {
        let store = self
            .loader
            .store
            .as_ref()
            .ok_or_else(|| CoreError::Configuration("no holding store configured".into()))?;

        let mut rows = store.list_holdings().await.into_result()?.unwrap_or_default();
        // The store lists newest first; locally holdings run oldest first.
        rows.reverse();
        let kept = self
            .portfolio_service
            .replace_holdings(&mut lock(&self.state).portfolio, rows);
        info!(count = kept, "holdings synced from store");
        Ok(kept)
    }

    /// Recorded price snapshots since `since`, newest first.
    pub async fn price_history_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<PriceSnapshot>, CoreError> {
        let store = self
            .loader
            .store
            .as_ref()
            .ok_or_else(|| CoreError::Configuration("no holding store configured".into()))?;
        Ok(store
            .price_history_since(since)
            .await
            .into_result()?
            .unwrap_or_default())
    }

    // ── Add-item form ───────────────────────────────────────────────

    #[must_use]
    pub fn form(&self) -> HoldingForm {
        lock(&self.state).form.clone()
    }

    /// Apply an edit to the add-item form.
    pub fn edit_form<F: FnOnce(&mut HoldingForm)>(&self, edit: F) {
        edit(&mut lock(&self.state).form);
    }

    #[must_use]
    pub fn form_problems(&self) -> Vec<FormProblem> {
        lock(&self.state).form.problems()
    }

    /// Whether the confirm action should be enabled.
    #[must_use]
    pub fn can_confirm(&self) -> bool {
        lock(&self.state).form.is_valid()
    }

    /// Discard the form input and start over with today's date.
    pub fn cancel_add(&self) {
        lock(&self.state).form.reset(Utc::now().date_naive());
    }

    /// Add a holding from the form, then reset the form. On error the form
    /// keeps its input.
    pub async fn confirm_add(&self) -> Result<Holding, CoreError> {
        let form = self.form();
        let holding = self.add_holding(&form).await?;
        lock(&self.state).form.reset(Utc::now().date_naive());
        Ok(holding)
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl Drop for SilverTracker {
    fn drop(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
    }
}
