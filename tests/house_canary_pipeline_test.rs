use std::sync::Arc;
use std::time::Duration;

use home_data::config::Credentials;
use home_data::store::FsPayloadStore;
use home_data::{
    CanonicalField, CanonicalValue, FetchError, FieldSet, HomeDataError, LocationQuery,
    NormalizationPipeline, SewerType, UnknownValuePolicy,
};
use home_data::providers::HouseCanaryAdapter;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn canary_returning(sewer: serde_json::Value) -> (MockServer, HouseCanaryAdapter) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/canary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "property/details": {
                "api_code": 0,
                "api_code_description": "ok",
                "result": {
                    "property": {"sewer": sewer, "water": "Municipal"},
                    "assessment": {"apn": "0123-456"}
                }
            }
        })))
        .mount(&server)
        .await;
    let adapter = HouseCanaryAdapter::new(
        format!("{}/canary", server.uri()),
        Duration::from_secs(7),
        Some(Credentials::new("my_key", "my_secret")),
    )
    .unwrap();
    (server, adapter)
}

fn query() -> LocationQuery {
    LocationQuery::new("123 Main St", "94132")
}

fn everything() -> FieldSet {
    FieldSet::from([CanonicalField::Sewer, CanonicalField::HasSeptic])
}

#[tokio::test]
async fn septic_home_reports_septic() {
    let (_server, adapter) = canary_returning(json!("Septic")).await;
    let data = NormalizationPipeline::default()
        .run(&adapter, &query(), &everything())
        .await
        .unwrap();

    assert_eq!(data[&CanonicalField::Sewer], CanonicalValue::Sewer(SewerType::Septic));
    assert_eq!(data[&CanonicalField::HasSeptic], CanonicalValue::Flag(true));
    assert_eq!(
        serde_json::to_value(&data).unwrap(),
        json!({"sewer": "septic", "has_septic": true})
    );
}

#[tokio::test]
async fn ambiguous_yes_is_type_unknown() {
    let (_server, adapter) = canary_returning(json!("Yes")).await;
    let data = NormalizationPipeline::default()
        .run(&adapter, &query(), &everything())
        .await
        .unwrap();

    assert_eq!(data[&CanonicalField::Sewer], CanonicalValue::Sewer(SewerType::TypeUnknown));
    assert_eq!(data[&CanonicalField::HasSeptic], CanonicalValue::Flag(false));
}

#[tokio::test]
async fn unrecognised_code_is_rejected_by_default() {
    let (_server, adapter) = canary_returning(json!("Unknown-Provider-Code")).await;
    let err = NormalizationPipeline::default()
        .run(&adapter, &query(), &everything())
        .await
        .unwrap_err();
    assert!(matches!(err, HomeDataError::ValueValidation { .. }));
}

#[tokio::test]
async fn unrecognised_code_falls_back_when_configured() {
    let (_server, adapter) = canary_returning(json!("Unknown-Provider-Code")).await;
    let pipeline = NormalizationPipeline::new(
        Arc::new(home_data::store::NoopPayloadStore),
        UnknownValuePolicy::Fallback,
    );
    let data = pipeline.run(&adapter, &query(), &everything()).await.unwrap();
    assert_eq!(
        data[&CanonicalField::Sewer],
        CanonicalValue::Sewer(SewerType::ExistenceUnknown)
    );
}

#[tokio::test]
async fn server_error_aborts_without_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let adapter = HouseCanaryAdapter::new(server.uri(), Duration::from_secs(7), None).unwrap();

    let err = NormalizationPipeline::default()
        .run(&adapter, &query(), &everything())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HomeDataError::Fetch {
            source: FetchError::Status(500),
            ..
        }
    ));
}

#[tokio::test]
async fn empty_request_returns_empty_result() {
    let (_server, adapter) = canary_returning(json!("Septic")).await;
    let data = NormalizationPipeline::default()
        .run(&adapter, &query(), &FieldSet::new())
        .await
        .unwrap();
    assert!(data.is_empty());
}

#[tokio::test]
async fn home_without_sewer_data_has_no_derived_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "property/details": {"result": {"property": {"water": "Well"}}}
        })))
        .mount(&server)
        .await;
    let adapter = HouseCanaryAdapter::new(server.uri(), Duration::from_secs(7), None).unwrap();

    let data = NormalizationPipeline::default()
        .run(&adapter, &query(), &everything())
        .await
        .unwrap();
    assert!(data.is_empty());
}

#[tokio::test]
async fn raw_payload_is_snapshotted() {
    let (_server, adapter) = canary_returning(json!("Storm")).await;
    let dir = tempdir().unwrap();
    let pipeline = NormalizationPipeline::new(
        Arc::new(FsPayloadStore::new(dir.path())),
        UnknownValuePolicy::Reject,
    );

    pipeline.run(&adapter, &query(), &everything()).await.unwrap();

    // The snapshot is written off the request path.
    let mut snapshots = Vec::new();
    for _ in 0..100 {
        snapshots = snapshot_files(&dir.path().join("sha256"));
        if !snapshots.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(snapshots.len(), 1);
    let body = std::fs::read(&snapshots[0]).unwrap();
    assert!(serde_json::from_slice::<serde_json::Value>(&body).is_ok());
}

fn snapshot_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(snapshot_files(&path));
        } else if std::fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false) {
            files.push(path);
        }
    }
    files
}
