use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::CoreError;

/// Default period between background price refreshes.
pub const DEFAULT_REFRESH_SECS: u64 = 30;

/// Which market-data integration backs the price feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    MetalsDev,
    GoldApi,
}

impl ProviderKind {
    /// Key under which this provider's API key lives in [`Settings::api_keys`].
    pub fn key_name(self) -> &'static str {
        match self {
            ProviderKind::MetalsDev => "metals_dev",
            ProviderKind::GoldApi => "goldapi",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metals_dev" | "metals.dev" | "metalsdev" => Ok(ProviderKind::MetalsDev),
            "goldapi" | "gold_api" | "goldapi.io" => Ok(ProviderKind::GoldApi),
            other => Err(CoreError::Configuration(format!(
                "Unknown price provider '{other}'. Supported: metals_dev, goldapi"
            ))),
        }
    }
}

/// Connection details for the PostgREST persistence backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    pub anon_key: String,
}

/// Runtime configuration for a [`crate::SilverTracker`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub provider: ProviderKind,

    /// API keys by provider key name ("metals_dev", "goldapi").
    pub api_keys: HashMap<String, String>,

    /// Overrides the selected provider's base URL.
    pub price_base_url: Option<String>,

    /// Request timeout in seconds. `None` keeps the provider's own default.
    pub request_timeout_secs: Option<u64>,

    pub refresh_interval_secs: u64,

    /// Persistence backend. `None` keeps holdings in memory only.
    pub store: Option<StoreSettings>,

    /// Record every live (non-fallback) quote in the price history collection.
    pub record_price_history: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_keys: HashMap::new(),
            price_base_url: None,
            request_timeout_secs: None,
            refresh_interval_secs: DEFAULT_REFRESH_SECS,
            store: None,
            record_price_history: false,
        }
    }
}

impl Settings {
    /// Read settings from process environment variables.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// Recognized variables: `SILVER_PROVIDER`, `METALS_DEV_API_KEY`,
    /// `GOLDAPI_API_KEY`, `SILVER_PRICE_URL`, `SILVER_TIMEOUT_SECS`,
    /// `SILVER_REFRESH_SECS`, `SUPABASE_URL`, `SUPABASE_ANON_KEY`,
    /// `SILVER_RECORD_HISTORY`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get("SILVER_PROVIDER") {
            settings.provider = provider.parse()?;
        }
        if let Some(key) = get("METALS_DEV_API_KEY") {
            settings.set_api_key(ProviderKind::MetalsDev, key);
        }
        if let Some(key) = get("GOLDAPI_API_KEY") {
            settings.set_api_key(ProviderKind::GoldApi, key);
        }
        settings.price_base_url = get("SILVER_PRICE_URL");
        if let Some(secs) = get("SILVER_TIMEOUT_SECS") {
            settings.request_timeout_secs = Some(parse_secs("SILVER_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = get("SILVER_REFRESH_SECS") {
            settings.refresh_interval_secs = parse_secs("SILVER_REFRESH_SECS", &secs)?;
        }
        match (get("SUPABASE_URL"), get("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => settings.store = Some(StoreSettings { url, anon_key }),
            (None, None) => {}
            _ => {
                return Err(CoreError::Configuration(
                    "SUPABASE_URL and SUPABASE_ANON_KEY must be set together".into(),
                ))
            }
        }
        if let Some(flag) = get("SILVER_RECORD_HISTORY") {
            settings.record_price_history = matches!(
                flag.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn set_api_key(&mut self, provider: ProviderKind, key: impl Into<String>) {
        self.api_keys.insert(provider.key_name().to_string(), key.into());
    }

    /// API key for the selected provider, if configured.
    pub fn active_api_key(&self) -> Option<&str> {
        self.api_keys
            .get(self.provider.key_name())
            .map(String::as_str)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.refresh_interval_secs == 0 {
            return Err(CoreError::Configuration(
                "refresh interval must be at least 1 second".into(),
            ));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(CoreError::Configuration(
                "request timeout must be at least 1 second".into(),
            ));
        }
        Ok(())
    }
}

fn parse_secs(var: &str, raw: &str) -> Result<u64, CoreError> {
    raw.trim().parse::<u64>().map_err(|_| {
        CoreError::Configuration(format!("{var} must be a whole number of seconds, got '{raw}'"))
    })
}
