use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::settings::{ProviderKind, Settings};

use super::goldapi::{self, GoldApiProvider};
use super::metals_dev::{self, MetalsDevProvider};
use super::traits::SpotPriceProvider;

/// Registry of configured spot-price providers.
///
/// Holds one provider per [`ProviderKind`]; the active one is chosen by
/// `Settings::provider`. New integrations are added here without touching
/// the feed or the view model.
pub struct PriceProviderRegistry {
    providers: Vec<(ProviderKind, Arc<dyn SpotPriceProvider>)>,
}

impl PriceProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with every provider that has an API key in `settings`.
    ///
    /// Base-URL and timeout overrides apply to the selected provider only.
    pub fn new_with_defaults(settings: &Settings) -> Self {
        let mut registry = Self::new();

        for kind in [ProviderKind::MetalsDev, ProviderKind::GoldApi] {
            let Some(key) = settings.api_keys.get(kind.key_name()) else {
                continue;
            };
            let selected = kind == settings.provider;
            let base_url = settings.price_base_url.clone().filter(|_| selected);
            let timeout = settings.request_timeout().filter(|_| selected);

            let provider: Arc<dyn SpotPriceProvider> = match kind {
                ProviderKind::MetalsDev => Arc::new(MetalsDevProvider::with_options(
                    key.clone(),
                    base_url.unwrap_or_else(|| metals_dev::BASE_URL.to_string()),
                    timeout.unwrap_or(metals_dev::DEFAULT_TIMEOUT),
                )),
                ProviderKind::GoldApi => Arc::new(GoldApiProvider::with_options(
                    key.clone(),
                    base_url.unwrap_or_else(|| goldapi::BASE_URL.to_string()),
                    timeout,
                )),
            };
            registry.register(kind, provider);
        }

        registry
    }

    /// Register (or replace) the provider for `kind`.
    pub fn register(&mut self, kind: ProviderKind, provider: Arc<dyn SpotPriceProvider>) {
        self.providers.retain(|(k, _)| *k != kind);
        self.providers.push((kind, provider));
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn SpotPriceProvider>> {
        self.providers
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, p)| Arc::clone(p))
    }

    /// The provider `settings` selects. Missing API key is a configuration error.
    pub fn select(&self, settings: &Settings) -> Result<Arc<dyn SpotPriceProvider>, CoreError> {
        self.get(settings.provider).ok_or_else(|| {
            CoreError::Configuration(format!(
                "no API key configured for price provider '{}'",
                settings.provider.key_name()
            ))
        })
    }

    /// Kinds that currently have a provider registered.
    pub fn kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|(k, _)| *k).collect()
    }
}

impl Default for PriceProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
