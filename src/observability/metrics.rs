//! Metrics collection and exposition.
//!
//! # Metrics
//! - `service_requests_total` (counter): call outcomes by service, status (success|failure)
//! - `service_request_latency_seconds` (histogram): call latency by service, retries included
//! - `service_circuit_state` (gauge): 0=closed, 1=open, 2=half-open, -1=unknown
//! - `service_circuit_rejections_total` (counter): calls refused by an open breaker
//!
//! # Design Decisions
//! - Updates go through the `metrics` facade (atomic, lock-free per handle)
//! - The Prometheus recorder is installed once by the binary; tests use a local recorder
//! - Histogram buckets match the classic Prometheus client defaults

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Once;
use std::time::Duration;
use thiserror::Error;

use crate::resilience::CircuitState;

pub const REQUESTS_TOTAL: &str = "service_requests_total";
pub const REQUEST_LATENCY_SECONDS: &str = "service_request_latency_seconds";
pub const CIRCUIT_STATE: &str = "service_circuit_state";
pub const CIRCUIT_REJECTIONS_TOTAL: &str = "service_circuit_rejections_total";

/// Gauge value for a state that could not be determined.
pub const UNKNOWN_STATE: f64 = -1.0;

const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

static DESCRIBE: Once = Once::new();

/// Errors from setting up the exporter.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to build Prometheus exporter: {0}")]
    Build(#[from] BuildError),
}

/// Outcome label for `service_requests_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// Records per-dependency call instrumentation.
///
/// Cheap to clone; every clone writes to the same process-wide instruments.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    _private: (),
}

impl MetricsRecorder {
    pub fn new() -> Self {
        DESCRIBE.call_once(|| {
            describe_counter!(REQUESTS_TOTAL, "Total number of requests");
            describe_histogram!(REQUEST_LATENCY_SECONDS, metrics::Unit::Seconds, "Latency of service calls");
            describe_gauge!(
                CIRCUIT_STATE,
                "Circuit state of services (0=closed, 1=open, 2=half-open)"
            );
            describe_counter!(CIRCUIT_REJECTIONS_TOTAL, "Calls rejected by an open circuit");
        });
        Self { _private: () }
    }

    pub fn record_outcome(&self, service: &str, outcome: Outcome) {
        counter!(
            REQUESTS_TOTAL,
            "service" => service.to_owned(),
            "status" => outcome.as_str()
        )
        .increment(1);
    }

    pub fn record_latency(&self, service: &str, elapsed: Duration) {
        histogram!(REQUEST_LATENCY_SECONDS, "service" => service.to_owned())
            .record(elapsed.as_secs_f64());
    }

    pub fn record_circuit_state(&self, service: &str, state: Option<CircuitState>) {
        let value = state.map(CircuitState::gauge_value).unwrap_or(UNKNOWN_STATE);
        gauge!(CIRCUIT_STATE, "service" => service.to_owned()).set(value);
    }

    pub fn record_rejection(&self, service: &str) {
        counter!(CIRCUIT_REJECTIONS_TOTAL, "service" => service.to_owned()).increment(1);
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Prometheus builder with the latency buckets applied.
///
/// # Errors
/// Returns `MetricsError::Build` if the bucket configuration is rejected.
pub fn exporter_builder() -> Result<PrometheusBuilder, MetricsError> {
    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_LATENCY_SECONDS.to_string()), LATENCY_BUCKETS)?;
    Ok(builder)
}

/// Install the global recorder and serve the scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
///
/// # Errors
/// Returns `MetricsError::Build` if the listener cannot bind or a recorder is
/// already installed.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    exporter_builder()?.with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics available");
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use metrics_exporter_prometheus::{PrometheusHandle, PrometheusRecorder};

    /// Local recorder plus a handle to render what was recorded.
    pub fn local_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = super::exporter_builder()
            .expect("valid buckets")
            .build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    /// Value of the first sample named `name` whose labels contain every `labels` pair.
    pub fn sample(rendered: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        rendered
            .lines()
            .filter(|line| !line.starts_with('#'))
            .filter(|line| {
                line.strip_prefix(name)
                    .is_some_and(|rest| rest.starts_with('{') || rest.starts_with(' '))
            })
            .filter(|line| {
                labels
                    .iter()
                    .all(|(k, v)| line.contains(&format!("{}=\"{}\"", k, v)))
            })
            .find_map(|line| line.rsplit(' ').next()?.parse().ok())
    }
}
