use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;

use super::{HouseCanaryAdapter, ProviderAdapter};
use crate::config::{Config, Credentials};
use crate::derive;
use crate::error::{HomeDataError, Result};

/// Registry of provider adapters, keyed by provider identifier.
#[derive(Default)]
pub struct ProviderRegistry {
    adapters: HashMap<&'static str, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry with every built-in provider.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        let credentials = Credentials::house_canary_from_env();
        if credentials.is_none() {
            info!("House Canary credentials not set, requests will be unauthenticated");
        }
        registry.register(Arc::new(HouseCanaryAdapter::from_config(
            &config.house_canary,
            credentials,
        )?))?;
        Ok(registry)
    }

    /// Register an adapter after checking its field table.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) -> Result<()> {
        validate_field_map(adapter.as_ref())?;
        self.adapters.insert(adapter.name(), adapter);
        Ok(())
    }

    pub fn get(&self, provider: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(provider).cloned()
    }

    pub fn resolve(&self, provider: &str) -> Result<Arc<dyn ProviderAdapter>> {
        self.get(provider)
            .ok_or_else(|| HomeDataError::UnknownProvider(provider.to_string()))
    }

    pub fn list_providers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adapters.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Check that an adapter's field table is total over its supported fields,
/// maps at most one provider field onto each canonical field, and never
/// targets a derived field.
pub fn validate_field_map(adapter: &dyn ProviderAdapter) -> Result<()> {
    let mut targets = BTreeMap::new();
    for &field in adapter.supported_fields() {
        let canonical = adapter.canonical_field(field).ok_or_else(|| {
            HomeDataError::AdapterConfig(format!(
                "{}: field `{}` has no canonical mapping",
                adapter.name(),
                field
            ))
        })?;
        if derive::is_derived(canonical) {
            return Err(HomeDataError::AdapterConfig(format!(
                "{}: field `{}` maps onto derived field `{}`",
                adapter.name(),
                field,
                canonical
            )));
        }
        if let Some(previous) = targets.insert(canonical, field) {
            return Err(HomeDataError::AdapterConfig(format!(
                "{}: fields `{}` and `{}` both map onto `{}`",
                adapter.name(),
                previous,
                field,
                canonical
            )));
        }
    }
    Ok(())
}
