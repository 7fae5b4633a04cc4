use std::time::Duration;
use thiserror::Error;

/// Transport-level failures while retrieving a provider payload.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider answered with status {0}")]
    Status(u16),
}

impl FetchError {
    /// Classify a reqwest error, keeping timeouts distinct from other failures.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            FetchError::Http(err)
        }
    }
}

#[derive(Error, Debug)]
pub enum HomeDataError {
    #[error("fetch from {provider} failed: {source}")]
    Fetch {
        provider: &'static str,
        #[source]
        source: FetchError,
    },

    #[error("{provider} response is missing `{container}`; the provider schema may have changed")]
    SchemaDrift {
        provider: &'static str,
        container: String,
    },

    #[error("{value} is not a known {provider} value for `{field}`")]
    ValueValidation {
        provider: &'static str,
        field: String,
        value: String,
    },

    #[error("derived field `{field}` failed: {message}")]
    Derivation { field: String, message: String },

    #[error("unknown canonical field: {0}")]
    UnknownField(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("adapter misconfigured: {0}")]
    AdapterConfig(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl HomeDataError {
    /// Short, stable label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            HomeDataError::Fetch { .. } => "fetch",
            HomeDataError::SchemaDrift { .. } => "schema_drift",
            HomeDataError::ValueValidation { .. } => "value_validation",
            HomeDataError::Derivation { .. } => "derivation",
            HomeDataError::UnknownField(_) => "unknown_field",
            HomeDataError::UnknownProvider(_) => "unknown_provider",
            HomeDataError::AdapterConfig(_) => "adapter_config",
            HomeDataError::Config(_) | HomeDataError::Toml(_) => "config",
            HomeDataError::Json(_) => "json",
        }
    }

    /// HTTP status the endpoint layer answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            HomeDataError::Fetch {
                source: FetchError::Timeout(_),
                ..
            } => 504,
            HomeDataError::Fetch { .. }
            | HomeDataError::SchemaDrift { .. }
            | HomeDataError::ValueValidation { .. }
            | HomeDataError::Json(_) => 502,
            HomeDataError::UnknownProvider(_) => 400,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, HomeDataError>;
