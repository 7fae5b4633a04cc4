//! Normalization pipeline: fetch → persist raw → parse → normalize → derive → project.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn, Instrument};
use uuid::Uuid;

use crate::config::PipelineSettings;
use crate::derive;
use crate::error::{HomeDataError, Result};
use crate::metrics::PipelineMetrics;
use crate::providers::{LocationQuery, ProviderAdapter, ProviderRecord, RawPayload};
use crate::schema::{self, FieldSet, HomeData};
use crate::store::{FsPayloadStore, NoopPayloadStore, PayloadStore};

/// What to do with a provider value outside the provider's own vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownValuePolicy {
    /// Fail the run with a value validation error.
    #[default]
    Reject,
    /// Log it and use the canonical field's fallback value.
    Fallback,
}

pub struct NormalizationPipeline {
    store: Arc<dyn PayloadStore>,
    unknown_values: UnknownValuePolicy,
}

impl Default for NormalizationPipeline {
    fn default() -> Self {
        Self::new(Arc::new(NoopPayloadStore), UnknownValuePolicy::default())
    }
}

impl NormalizationPipeline {
    pub fn new(store: Arc<dyn PayloadStore>, unknown_values: UnknownValuePolicy) -> Self {
        Self {
            store,
            unknown_values,
        }
    }

    pub fn from_settings(settings: &PipelineSettings) -> Self {
        let store: Arc<dyn PayloadStore> = match &settings.payload_dir {
            Some(dir) => Arc::new(FsPayloadStore::new(dir)),
            None => Arc::new(NoopPayloadStore),
        };
        Self::new(store, settings.unknown_values)
    }

    /// Run every stage for one lookup and return only the requested fields.
    #[instrument(skip_all, fields(provider = adapter.name(), run_id = %Uuid::new_v4()))]
    pub async fn run(
        &self,
        adapter: &dyn ProviderAdapter,
        query: &LocationQuery,
        requested: &FieldSet,
    ) -> Result<HomeData> {
        let started = Instant::now();
        match self.run_stages(adapter, query, requested).await {
            Ok(data) => {
                PipelineMetrics::record_run_success(adapter.name(), started.elapsed().as_secs_f64());
                info!(fields = data.len(), "Pipeline finished");
                Ok(data)
            }
            Err(e) => {
                PipelineMetrics::record_run_error(adapter.name(), e.kind());
                warn!(error = %e, "Pipeline failed");
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        adapter: &dyn ProviderAdapter,
        query: &LocationQuery,
        requested: &FieldSet,
    ) -> Result<HomeData> {
        let raw = adapter.fetch(query).await?;
        self.persist_raw(&raw);

        let working = working_set(requested);
        let parsed = adapter.parse(&raw, &working)?;
        debug!(fields = parsed.len(), "Parsed provider payload");

        let mut data = self.normalize(adapter, parsed)?;
        let derived = derive::apply(&mut data)?;
        PipelineMetrics::record_derived(derived);

        Ok(project(data, requested))
    }

    /// Snapshot the raw payload on a background task. The run never waits on
    /// the store; failures are logged and counted only.
    fn persist_raw(&self, raw: &RawPayload) {
        let store = Arc::clone(&self.store);
        let raw = raw.clone();
        tokio::spawn(
            async move {
                match store.put(&raw).await {
                    Ok(Some(payload_ref)) => debug!(%payload_ref, "Stored raw payload"),
                    Ok(None) => {}
                    Err(e) => {
                        PipelineMetrics::record_payload_store_error(raw.provider);
                        warn!(error = %e, "Failed to store raw payload");
                    }
                }
            }
            .in_current_span(),
        );
    }

    /// Translate provider field names and values into the generic schema.
    ///
    /// Adapters are registered with an injective field table, so each canonical
    /// field is written at most once. Were that ever violated the last provider
    /// field in name order would win.
    pub fn normalize(&self, adapter: &dyn ProviderAdapter, record: ProviderRecord) -> Result<HomeData> {
        let mut data = HomeData::new();
        for (provider_field, value) in record {
            let canonical = adapter.canonical_field(&provider_field).ok_or_else(|| {
                HomeDataError::AdapterConfig(format!(
                    "{}: parsed field `{}` has no canonical mapping",
                    adapter.name(),
                    provider_field
                ))
            })?;

            if let Err(e) = adapter.validate_value(&provider_field, &value) {
                match self.unknown_values {
                    UnknownValuePolicy::Reject => return Err(e),
                    UnknownValuePolicy::Fallback => {
                        warn!(field = %provider_field, %value, "Unrecognised provider value, using fallback");
                        PipelineMetrics::record_unknown_value(adapter.name());
                        data.insert(canonical, schema::fallback(canonical));
                        continue;
                    }
                }
            }

            let translated = adapter
                .translate_value(&provider_field, &value)
                .ok_or_else(|| {
                    HomeDataError::AdapterConfig(format!(
                        "{}: no value table for field `{}`",
                        adapter.name(),
                        provider_field
                    ))
                })?;
            if !schema::is_valid(canonical, &translated) {
                return Err(HomeDataError::AdapterConfig(format!(
                    "{}: `{}` translated to {:?}, outside the `{}` domain",
                    adapter.name(),
                    provider_field,
                    translated,
                    canonical
                )));
            }
            if translated == schema::fallback(canonical) {
                PipelineMetrics::record_unknown_value(adapter.name());
            }
            data.insert(canonical, translated);
        }
        Ok(data)
    }
}

/// Requested fields plus everything the requested derived fields depend on.
pub fn working_set(requested: &FieldSet) -> FieldSet {
    let mut working = requested.clone();
    for derived in derive::derived_fields() {
        if requested.contains(derived.field) {
            for &dep in derived.depends_on {
                working.insert(dep);
            }
        }
    }
    working
}

/// Keep only the requested fields.
pub fn project(data: HomeData, requested: &FieldSet) -> HomeData {
    data.into_iter()
        .filter(|(field, _)| requested.contains(*field))
        .collect()
}
