//! Toy downstream dependency for local runs.
//!
//! `GET /data` answers `{"source", "data"}` or, with probability
//! `--failure-rate`, `500 "<source> failed"`.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use clap::Parser;
use rand::Rng;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mock-dependency")]
#[command(about = "Flaky JSON endpoint for exercising the failover client", long_about = None)]
struct Cli {
    #[arg(short, long, default_value_t = 5001)]
    port: u16,

    /// Name echoed in every payload.
    #[arg(short, long, default_value = "Service A")]
    source: String,

    /// Probability (0.0-1.0) of answering 500.
    #[arg(short, long, default_value_t = 0.6)]
    failure_rate: f64,

    /// Artificial delay before answering, in milliseconds.
    #[arg(short, long, default_value_t = 0)]
    latency_ms: u64,
}

struct MockState {
    source: String,
    failure_rate: f64,
    latency: Duration,
}

async fn data(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    if !state.latency.is_zero() {
        tokio::time::sleep(state.latency).await;
    }

    let fail = rand::thread_rng().gen_bool(state.failure_rate);
    if fail {
        tracing::info!(source = %state.source, "Injecting failure");
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("{} failed", state.source)).into_response();
    }

    Json(json!({
        "source": state.source,
        "data": format!("Hello from {}!", state.source),
    }))
    .into_response()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_dependency=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if !(0.0..=1.0).contains(&cli.failure_rate) {
        return Err(format!("--failure-rate must be within 0.0..=1.0, got {}", cli.failure_rate).into());
    }

    let state = Arc::new(MockState {
        source: cli.source.clone(),
        failure_rate: cli.failure_rate,
        latency: Duration::from_millis(cli.latency_ms),
    });

    let app = Router::new()
        .route("/data", get(data))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], cli.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        address = %addr,
        source = %cli.source,
        failure_rate = cli.failure_rate,
        "Mock dependency listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
