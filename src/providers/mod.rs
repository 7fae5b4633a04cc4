//! Provider adapters.
//!
//! Each data source gets one adapter translating its vocabulary into the
//! generic schema. To add a provider:
//!
//! 1. Create a module with the provider's field and value enums
//! 2. Implement [`ProviderAdapter`] for the adapter struct
//! 3. Register it in [`registry::ProviderRegistry::from_config`]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::schema::{CanonicalField, CanonicalValue, FieldSet};

pub mod house_canary;
pub mod registry;

pub use house_canary::HouseCanaryAdapter;
pub use registry::ProviderRegistry;

/// Parsed provider data: provider field name to the provider's raw value.
pub type ProviderRecord = BTreeMap<String, Value>;

/// Where to look a home up. Both parts are passed to the provider untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationQuery {
    pub address: String,
    pub zip_code: String,
}

impl LocationQuery {
    pub fn new(address: impl Into<String>, zip_code: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            zip_code: zip_code.into(),
        }
    }
}

/// A provider response body, exactly as received.
#[derive(Debug, Clone)]
pub struct RawPayload {
    pub provider: &'static str,
    pub body: Vec<u8>,
    pub fetched_at: DateTime<Utc>,
}

impl RawPayload {
    pub fn new(provider: &'static str, body: Vec<u8>) -> Self {
        Self {
            provider,
            body,
            fetched_at: Utc::now(),
        }
    }

    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Plugin interface for data providers.
///
/// Adapters are immutable once built and shared across requests, so every
/// operation takes `&self` and per-request input is passed explicitly.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider identifier (e.g. "house_canary").
    fn name(&self) -> &'static str;

    /// Provider field names this adapter knows how to retrieve.
    fn supported_fields(&self) -> &'static [&'static str];

    /// Canonical counterpart of a supported provider field.
    fn canonical_field(&self, provider_field: &str) -> Option<CanonicalField>;

    /// Retrieve the raw payload for a location.
    async fn fetch(&self, query: &LocationQuery) -> Result<RawPayload>;

    /// Extract the supported fields whose canonical counterpart is in `wanted`.
    ///
    /// Unexpected keys are dropped. A payload missing the container the
    /// adapter reads from is reported as schema drift.
    fn parse(&self, raw: &RawPayload, wanted: &FieldSet) -> Result<ProviderRecord>;

    /// Check that `value` belongs to the provider's own vocabulary for the field.
    fn validate_value(&self, provider_field: &str, value: &Value) -> Result<()>;

    /// Translate a provider value into the canonical domain.
    ///
    /// Values without a table entry translate to the field's fallback value.
    /// Returns `None` only for fields the adapter does not support.
    fn translate_value(&self, provider_field: &str, value: &Value) -> Option<CanonicalValue>;

    /// Supported provider fields that feed any of `wanted`.
    fn fields_for(&self, wanted: &FieldSet) -> Vec<&'static str> {
        self.supported_fields()
            .iter()
            .copied()
            .filter(|field| {
                self.canonical_field(field)
                    .is_some_and(|canonical| wanted.contains(canonical))
            })
            .collect()
    }
}
