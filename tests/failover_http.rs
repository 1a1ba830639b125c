//! End-to-end failover tests against real sockets.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use failover_client::bootstrap::build_chain;
use failover_client::config::{ClientConfig, DependencyConfig};
use failover_client::dependency::{HttpDependency, RemoteCall};
use failover_client::observability::MetricsRecorder;
use failover_client::resilience::{CircuitState, RetryPolicy};
use failover_client::{CallError, ChainOutcome};
use serde_json::json;

mod common;

fn counted<F>(hits: Arc<AtomicU32>, respond: F) -> impl Fn() -> std::future::Ready<(u16, String)> + Send + Sync + 'static
where
    F: Fn(u32) -> (u16, String) + Send + Sync + 'static,
{
    move || {
        let n = hits.fetch_add(1, Ordering::SeqCst);
        std::future::ready(respond(n))
    }
}

fn payload(source: &str) -> String {
    json!({"source": source, "data": format!("Hello from {}!", source)}).to_string()
}

fn sample(rendered: &str, series: &str) -> Option<f64> {
    rendered
        .lines()
        .find_map(|line| line.strip_prefix(series))
        .and_then(|value| value.trim().parse().ok())
}

fn config_for(urls: &[(&str, String)]) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.dependencies = urls
        .iter()
        .map(|(name, url)| {
            let mut dep = DependencyConfig::new(*name, url.clone());
            dep.timeout_secs = 2;
            dep
        })
        .collect();
    config.retry.max_attempts = 2;
    config.retry.delay_ms = 50;
    config.observability.metrics_enabled = false;
    config
}

#[tokio::test]
async fn test_http_dependency_returns_json_payload() {
    let addr = common::start_programmable_backend(|| async { (200, payload("Service B")) }).await;
    let dep = HttpDependency::new("service_b", common::data_url(addr), Duration::from_secs(2), reqwest::Client::new());

    let body = dep.call().await.unwrap();
    assert_eq!(body, json!({"source": "Service B", "data": "Hello from Service B!"}));
}

#[tokio::test]
async fn test_client_error_is_permanent_and_not_retried() {
    let hits = Arc::new(AtomicU32::new(0));
    let addr = common::start_programmable_backend(counted(hits.clone(), |_| (404, "missing".into()))).await;
    let dep = HttpDependency::new("a", common::data_url(addr), Duration::from_secs(2), reqwest::Client::new());
    let policy = RetryPolicy::new(3, Duration::from_millis(10));

    let err = policy.execute(|| dep.call()).await.unwrap_err();

    assert_eq!(err, CallError::Permanent("HTTP 404 Not Found".into()));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_malformed_body_is_permanent() {
    let addr = common::start_programmable_backend(|| async { (200, "not json".to_string()) }).await;
    let dep = HttpDependency::new("a", common::data_url(addr), Duration::from_secs(2), reqwest::Client::new());

    let err = dep.call().await.unwrap_err();
    assert_eq!(err, CallError::Permanent("malformed payload".into()));
}

#[tokio::test]
async fn test_slow_dependency_times_out_as_transient() {
    let hits = Arc::new(AtomicU32::new(0));
    let h = hits.clone();
    let addr = common::start_programmable_backend(move || {
        h.fetch_add(1, Ordering::SeqCst);
        async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            (200, payload("Service A"))
        }
    })
    .await;
    let dep = HttpDependency::new("a", common::data_url(addr), Duration::from_millis(200), reqwest::Client::new());
    let policy = RetryPolicy::new(2, Duration::from_millis(100));

    let started = std::time::Instant::now();
    let err = policy.execute(|| dep.call()).await.unwrap_err();

    match &err {
        CallError::RetryExhausted { attempts, last } => {
            assert_eq!(*attempts, 2);
            assert_eq!(**last, CallError::timeout(Duration::from_millis(200)));
        }
        other => panic!("expected RetryExhausted, got {:?}", other),
    }
    assert!(started.elapsed() >= Duration::from_millis(500));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_server_error_retried_then_served() {
    let hits = Arc::new(AtomicU32::new(0));
    let addr = common::start_programmable_backend(counted(hits.clone(), |n| {
        if n == 0 {
            (500, "Service A failed".into())
        } else {
            (200, payload("Service A"))
        }
    }))
    .await;

    let chain = build_chain(&config_for(&[("service_a", common::data_url(addr))]), MetricsRecorder::new()).unwrap();
    let outcome = chain.invoke().await;

    assert_eq!(outcome.served_by(), Some("service_a"));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(chain.invokers()[0].breaker().snapshot().failure_count, 0);
}

#[tokio::test]
async fn test_failing_primary_trips_and_backup_serves() {
    let (recorder, handle) = {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    };
    let _guard = metrics::set_default_local_recorder(&recorder);

    let a_hits = Arc::new(AtomicU32::new(0));
    let b_hits = Arc::new(AtomicU32::new(0));
    let a = common::start_programmable_backend(counted(a_hits.clone(), |_| (500, "Service A failed".into()))).await;
    let b = common::start_programmable_backend(counted(b_hits.clone(), |_| (200, payload("Service B")))).await;

    let config = config_for(&[("service_a", common::data_url(a)), ("service_b", common::data_url(b))]);
    let chain = build_chain(&config, MetricsRecorder::new()).unwrap();

    for _ in 0..2 {
        assert_eq!(chain.invoke().await.served_by(), Some("service_b"));
    }
    assert_eq!(chain.invokers()[0].circuit_state(), CircuitState::Open);
    assert_eq!(a_hits.load(Ordering::SeqCst), 4);

    let outcome = chain.invoke().await;
    assert_eq!(a_hits.load(Ordering::SeqCst), 4, "open circuit must short-circuit service_a");
    assert_eq!(b_hits.load(Ordering::SeqCst), 3);
    assert_eq!(
        outcome,
        ChainOutcome::Served {
            dependency: "service_b".into(),
            payload: json!({"source": "Service B", "data": "Hello from Service B!"}),
        }
    );

    let rendered = handle.render();
    assert_eq!(sample(&rendered, "service_circuit_state{service=\"service_a\"}"), Some(1.0), "{}", rendered);
    assert_eq!(sample(&rendered, "service_circuit_state{service=\"service_b\"}"), Some(0.0), "{}", rendered);
    assert_eq!(
        sample(&rendered, "service_circuit_rejections_total{service=\"service_a\"}"),
        Some(1.0),
        "{}",
        rendered
    );
}

#[tokio::test]
async fn test_everything_down_degrades() {
    let a = common::start_programmable_backend(|| async { (503, "down".to_string()) }).await;
    let b = common::start_programmable_backend(|| async { (500, "down".to_string()) }).await;

    let config = config_for(&[("service_a", common::data_url(a)), ("service_b", common::data_url(b))]);
    let chain = build_chain(&config, MetricsRecorder::new()).unwrap();

    let outcome = chain.invoke().await;
    assert!(outcome.is_degraded());
    assert_eq!(outcome.into_payload(), json!({"error": "All dependencies are down"}));
}
