use std::process::Stdio;

use serde_json::{json, Value};
use tempfile::tempdir;
use tokio::process::Command;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn lookup_prints_only_json_on_stdout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/canary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "property/details": {
                "api_code": 0,
                "result": {"property": {"sewer": "Septic"}}
            }
        })))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        format!("[house_canary]\nbase_url = \"{}/canary\"\ntimeout_seconds = 7\n", server.uri()),
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_home_data"))
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env("HOUSE_CANARY_API_KEY", "my_key")
        .env("HOUSE_CANARY_API_SECRET", "my_secret")
        .arg("--config")
        .arg(&config)
        .args(["lookup", "--address", "123 Main St", "--zip", "94132"])
        .args(["--fields", "sewer,has_septic"])
        .stdin(Stdio::null())
        .output()
        .await
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stdout, json!({"sewer": "septic", "has_septic": true}));
    // The run's info logs still go somewhere.
    assert!(String::from_utf8_lossy(&output.stderr).contains("Pipeline finished"));
}
