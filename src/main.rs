//! Failover client (v1)
//!
//! Calls a prioritized list of unreliable HTTP dependencies through
//! per-dependency circuit breakers and bounded retries.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌────────┐    ┌──────────────────────────────────────────────────────────┐
//!   │ driver │───▶│ FallbackChain                                            │
//!   └────────┘    │  ┌──────────────────────────┐   ┌─────────────────────┐  │
//!                 │  │ ServiceInvoker A         │──▶│ ServiceInvoker B    │  │
//!                 │  │ breaker → retry → remote │   │ (tried on failure)  │  │
//!                 │  └────────────┬─────────────┘   └──────────┬──────────┘  │
//!                 └───────────────┼────────────────────────────┼─────────────┘
//!                                 ▼                            ▼
//!                          http://…:5001/data           http://…:5002/data
//!
//!   Cross-cutting: config (TOML) · logging (tracing) · metrics (Prometheus)
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use failover_client::bootstrap::build_chain;
use failover_client::config::{load_config, ClientConfig};
use failover_client::driver::Driver;
use failover_client::observability::{logging, metrics, MetricsRecorder};

#[derive(Parser)]
#[command(name = "failover-client")]
#[command(about = "Call unreliable dependencies with circuit breakers, retries and fallback", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override driver.iterations.
    #[arg(short = 'n', long)]
    iterations: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(n) = cli.iterations {
        config.driver.iterations = n;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("failover-client v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    tracing::info!(
        dependencies = config.dependencies.len(),
        max_attempts = config.retry.max_attempts,
        retry_delay_ms = config.retry.delay_ms,
        iterations = config.driver.iterations,
        "Configuration loaded"
    );

    let chain = Arc::new(build_chain(&config, MetricsRecorder::new())?);
    let driver = Driver::from_config(chain, &config.driver);

    let report = driver
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    tracing::info!(served = report.served, degraded = report.degraded, "Shutdown complete");
    Ok(())
}
