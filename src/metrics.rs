//! Pipeline metrics.
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus recorder,
//! so library users and tests pay nothing for it.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::{Once, OnceLock};
use tracing::{info, warn};

static INIT: Once = Once::new();
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder. Idempotent.
pub fn init_metrics() {
    INIT.call_once(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = HANDLE.set(handle);
            PipelineMetrics::describe();
            info!("Prometheus recorder installed");
        }
        Err(e) => warn!("Prometheus recorder install failed: {}", e),
    });
}

/// Render the current metrics in Prometheus text format.
pub fn render() -> Option<String> {
    HANDLE.get().map(PrometheusHandle::render)
}

/// Metrics emitted by the normalization pipeline and provider adapters.
pub struct PipelineMetrics;

impl PipelineMetrics {
    fn describe() {
        ::metrics::describe_counter!("home_data_runs_total", "Completed pipeline runs");
        ::metrics::describe_counter!("home_data_run_errors_total", "Pipeline runs that failed, by error kind");
        ::metrics::describe_histogram!("home_data_run_duration_seconds", "End-to-end pipeline duration");
        ::metrics::describe_histogram!("home_data_fetch_duration_seconds", "Provider fetch duration");
        ::metrics::describe_histogram!("home_data_payload_bytes", "Raw provider payload size");
        ::metrics::describe_counter!(
            "home_data_unknown_values_total",
            "Provider values normalized to a canonical unknown value"
        );
        ::metrics::describe_counter!(
            "home_data_payload_store_errors_total",
            "Raw payload snapshots that could not be written"
        );
        ::metrics::describe_counter!("home_data_derived_fields_total", "Derived fields computed");
    }

    pub fn record_run_success(provider: &'static str, duration_secs: f64) {
        ::metrics::counter!("home_data_runs_total", "provider" => provider).increment(1);
        ::metrics::histogram!("home_data_run_duration_seconds", "provider" => provider).record(duration_secs);
    }

    pub fn record_run_error(provider: &'static str, kind: &'static str) {
        ::metrics::counter!("home_data_run_errors_total", "provider" => provider, "kind" => kind).increment(1);
    }

    pub fn record_fetch(provider: &'static str, duration_secs: f64, payload_bytes: usize) {
        ::metrics::histogram!("home_data_fetch_duration_seconds", "provider" => provider).record(duration_secs);
        ::metrics::histogram!("home_data_payload_bytes", "provider" => provider).record(payload_bytes as f64);
    }

    pub fn record_unknown_value(provider: &'static str) {
        ::metrics::counter!("home_data_unknown_values_total", "provider" => provider).increment(1);
    }

    pub fn record_payload_store_error(provider: &'static str) {
        ::metrics::counter!("home_data_payload_store_errors_total", "provider" => provider).increment(1);
    }

    pub fn record_derived(count: usize) {
        ::metrics::counter!("home_data_derived_fields_total").increment(count as u64);
    }
}
