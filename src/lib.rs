//! Normalized home data from third-party real-estate providers.
//!
//! Each provider speaks its own vocabulary. An adapter per provider translates
//! that vocabulary into the generic schema in [`schema`], and
//! [`pipeline::NormalizationPipeline`] drives a lookup through
//! fetch → persist raw → parse → normalize → derive → project.
//!
//! ```ignore
//! let registry = ProviderRegistry::from_config(&config)?;
//! let adapter = registry.resolve("house_canary")?;
//! let data = NormalizationPipeline::default()
//!     .run(adapter.as_ref(), &LocationQuery::new("1 Elm St", "02134"), &fields)
//!     .await?;
//! ```

pub mod config;
pub mod constants;
pub mod derive;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod providers;
pub mod schema;
pub mod server;
pub mod store;

pub use error::{FetchError, HomeDataError, Result};
pub use pipeline::{NormalizationPipeline, UnknownValuePolicy};
pub use providers::{LocationQuery, ProviderAdapter, ProviderRegistry, RawPayload};
pub use schema::{CanonicalField, CanonicalValue, FieldSet, HomeData, SewerType};
