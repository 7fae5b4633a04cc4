use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

use super::{LocationQuery, ProviderAdapter, ProviderRecord, RawPayload};
use crate::config::{Credentials, HouseCanaryConfig};
use crate::constants::HOUSE_CANARY;
use crate::error::{FetchError, HomeDataError, Result};
use crate::metrics::PipelineMetrics;
use crate::schema::{self, CanonicalField, CanonicalValue, FieldSet, SewerType};

/// Fields House Canary can return that we know how to normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HouseCanaryField {
    Sewer,
}

impl HouseCanaryField {
    const NAMES: &'static [&'static str] = &["sewer"];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sewer" => Some(HouseCanaryField::Sewer),
            _ => None,
        }
    }

    pub fn canonical(self) -> CanonicalField {
        match self {
            HouseCanaryField::Sewer => CanonicalField::Sewer,
        }
    }
}

/// House Canary's `sewer` vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SewerDetail {
    Municipal,
    Septic,
    Storm,
    None,
    /// Presence without detail.
    Yes,
}

impl SewerDetail {
    pub fn from_provider(value: &str) -> Option<Self> {
        match value {
            "Municipal" => Some(SewerDetail::Municipal),
            "Septic" => Some(SewerDetail::Septic),
            "Storm" => Some(SewerDetail::Storm),
            "None" => Some(SewerDetail::None),
            "Yes" => Some(SewerDetail::Yes),
            _ => None,
        }
    }

    pub fn as_provider(self) -> &'static str {
        match self {
            SewerDetail::Municipal => "Municipal",
            SewerDetail::Septic => "Septic",
            SewerDetail::Storm => "Storm",
            SewerDetail::None => "None",
            SewerDetail::Yes => "Yes",
        }
    }

    pub fn to_generic(self) -> SewerType {
        match self {
            SewerDetail::Municipal => SewerType::Municipal,
            SewerDetail::Septic => SewerType::Septic,
            SewerDetail::Storm => SewerType::Storm,
            SewerDetail::None => SewerType::NoSewer,
            SewerDetail::Yes => SewerType::TypeUnknown,
        }
    }
}

/// Translate a raw `sewer` value; anything unrecognised is the sewer fallback.
pub fn sewer_to_generic(value: &Value) -> CanonicalValue {
    match value.as_str().and_then(SewerDetail::from_provider) {
        Some(detail) => CanonicalValue::Sewer(detail.to_generic()),
        None => schema::fallback(CanonicalField::Sewer),
    }
}

/// Adapter for the House Canary property details API.
pub struct HouseCanaryAdapter {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    credentials: Option<Credentials>,
}

impl HouseCanaryAdapter {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Option<Credentials>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HomeDataError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
            credentials,
        })
    }

    pub fn from_config(config: &HouseCanaryConfig, credentials: Option<Credentials>) -> Result<Self> {
        Self::new(config.base_url.clone(), config.timeout(), credentials)
    }

    fn fetch_error(&self, source: FetchError) -> HomeDataError {
        HomeDataError::Fetch {
            provider: HOUSE_CANARY,
            source,
        }
    }

    fn drift(container: &str) -> HomeDataError {
        HomeDataError::SchemaDrift {
            provider: HOUSE_CANARY,
            container: container.to_string(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for HouseCanaryAdapter {
    fn name(&self) -> &'static str {
        HOUSE_CANARY
    }

    fn supported_fields(&self) -> &'static [&'static str] {
        HouseCanaryField::NAMES
    }

    fn canonical_field(&self, provider_field: &str) -> Option<CanonicalField> {
        HouseCanaryField::from_name(provider_field).map(HouseCanaryField::canonical)
    }

    #[instrument(skip(self, query))]
    async fn fetch(&self, query: &LocationQuery) -> Result<RawPayload> {
        let started = Instant::now();
        let mut request = self.client.get(&self.base_url).query(&[
            ("address", query.address.as_str()),
            ("zipcode", query.zip_code.as_str()),
        ]);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.api_key, Some(&credentials.api_secret));
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.fetch_error(FetchError::from_reqwest(e, self.timeout)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.fetch_error(FetchError::Status(status.as_u16())));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| self.fetch_error(FetchError::from_reqwest(e, self.timeout)))?
            .to_vec();

        PipelineMetrics::record_fetch(HOUSE_CANARY, started.elapsed().as_secs_f64(), body.len());
        info!(bytes = body.len(), "Fetched House Canary property details");
        Ok(RawPayload::new(HOUSE_CANARY, body))
    }

    fn parse(&self, raw: &RawPayload, wanted: &FieldSet) -> Result<ProviderRecord> {
        let payload = raw.json()?;
        let result = payload
            .get("property/details")
            .ok_or_else(|| Self::drift("property/details"))?
            .get("result")
            .and_then(Value::as_object)
            .ok_or_else(|| Self::drift("property/details.result"))?;

        // `property` and `assessment` are merged; assessment keys win.
        let mut merged = Map::new();
        for section in ["property", "assessment"] {
            if let Some(Value::Object(values)) = result.get(section) {
                merged.extend(values.clone());
            }
        }

        let record: ProviderRecord = merged
            .into_iter()
            .filter(|(key, _)| {
                HouseCanaryField::from_name(key).is_some_and(|field| wanted.contains(field.canonical()))
            })
            .collect();
        debug!(fields = record.len(), "Parsed House Canary payload");
        Ok(record)
    }

    fn validate_value(&self, provider_field: &str, value: &Value) -> Result<()> {
        let known = match HouseCanaryField::from_name(provider_field) {
            Some(HouseCanaryField::Sewer) => value.as_str().and_then(SewerDetail::from_provider).is_some(),
            None => false,
        };
        if known {
            Ok(())
        } else {
            Err(HomeDataError::ValueValidation {
                provider: HOUSE_CANARY,
                field: provider_field.to_string(),
                value: value.to_string(),
            })
        }
    }

    fn translate_value(&self, provider_field: &str, value: &Value) -> Option<CanonicalValue> {
        match HouseCanaryField::from_name(provider_field)? {
            HouseCanaryField::Sewer => Some(sewer_to_generic(value)),
        }
    }
}
