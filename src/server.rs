use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use hyper::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::constants::DEFAULT_PROVIDER;
use crate::error::HomeDataError;
use crate::metrics;
use crate::pipeline::NormalizationPipeline;
use crate::providers::{LocationQuery, ProviderRegistry};
use crate::schema::{FieldSet, HomeData};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ProviderRegistry>,
    pub pipeline: Arc<NormalizationPipeline>,
}

/// Error body returned by the API.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<HomeDataError> for ApiError {
    fn from(err: HomeDataError) -> Self {
        Self {
            status: StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

/// Query parameters of a home data lookup. `fields` may repeat and may hold
/// comma-separated names.
#[derive(Debug, PartialEq)]
pub struct HomeDataQuery {
    pub provider: String,
    pub location: LocationQuery,
    pub fields: FieldSet,
}

impl HomeDataQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, ApiError> {
        let mut address = None;
        let mut zip = None;
        let mut provider = None;
        let mut names = Vec::new();
        for (key, value) in pairs {
            match key.as_str() {
                "address" => address = Some(value),
                "zip" => zip = Some(value),
                "provider" => provider = Some(value),
                "fields" => names.extend(value.split(',').map(str::to_string)),
                _ => {}
            }
        }

        let address = address.ok_or_else(|| ApiError::bad_request("missing `address` parameter"))?;
        let zip = zip.ok_or_else(|| ApiError::bad_request("missing `zip` parameter"))?;
        let (fields, ignored) = FieldSet::parse_lenient(&names);
        if !ignored.is_empty() {
            debug!(?ignored, "Ignoring fields outside the schema");
        }
        Ok(Self {
            provider: provider.unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            location: LocationQuery::new(address, zip),
            fields,
        })
    }
}

/// Home data for non-registered users.
async fn unregistered_home_data(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<HomeData>, ApiError> {
    let query = HomeDataQuery::from_pairs(pairs)?;
    let adapter = state.registry.resolve(&query.provider)?;
    let data = state
        .pipeline
        .run(adapter.as_ref(), &query.location, &query.fields)
        .await?;
    Ok(Json(data))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "home_data",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn metrics_handler() -> impl IntoResponse {
    match metrics::render() {
        Some(body) => (StatusCode::OK, body),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed".to_string()),
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_methods([Method::GET]).allow_origin(Any);
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .route("/v1/home/unregistered_home_data", get(unregistered_home_data))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    info!("Listening on http://{}", addr);
    Server::bind(&addr)
        .serve(router(state).into_make_service())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CanonicalField;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn query_collects_repeated_and_comma_separated_fields() {
        let query = HomeDataQuery::from_pairs(pairs(&[
            ("address", "1 Elm St"),
            ("zip", "02134"),
            ("fields", "sewer"),
            ("fields", "has_septic,pool"),
        ]))
        .unwrap();
        assert_eq!(query.provider, DEFAULT_PROVIDER);
        assert_eq!(query.location, LocationQuery::new("1 Elm St", "02134"));
        assert_eq!(
            query.fields,
            FieldSet::from([CanonicalField::Sewer, CanonicalField::HasSeptic])
        );
    }

    #[test]
    fn query_requires_a_location() {
        let err = HomeDataQuery::from_pairs(pairs(&[("address", "1 Elm St")])).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("zip"));
    }

    #[test]
    fn missing_fields_means_nothing_requested() {
        let query =
            HomeDataQuery::from_pairs(pairs(&[("address", "1 Elm St"), ("zip", "02134")])).unwrap();
        assert!(query.fields.is_empty());
    }
}
