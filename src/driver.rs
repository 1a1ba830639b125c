//! Driving loop.
//!
//! Calls the fallback chain a fixed number of times on a fixed interval,
//! logging each served payload or degraded result. Stops early when the
//! shutdown future completes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::DriverConfig;
use crate::fallback::{ChainOutcome, FallbackChain};

/// Tally of a driver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverReport {
    pub served: u32,
    pub degraded: u32,
}

impl DriverReport {
    pub fn total(&self) -> u32 {
        self.served + self.degraded
    }
}

pub struct Driver {
    chain: Arc<FallbackChain>,
    iterations: u32,
    interval: Duration,
}

impl Driver {
    pub fn new(chain: Arc<FallbackChain>, iterations: u32, interval: Duration) -> Self {
        Self {
            chain,
            iterations,
            interval,
        }
    }

    pub fn from_config(chain: Arc<FallbackChain>, config: &DriverConfig) -> Self {
        Self::new(chain, config.iterations, Duration::from_secs(config.interval_secs))
    }

    /// Run until `iterations` invocations complete or `shutdown` resolves.
    pub async fn run<S>(&self, shutdown: S) -> DriverReport
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut report = DriverReport::default();

        for i in 1..=self.iterations {
            let request_id = Uuid::new_v4();
            let span = tracing::info_span!("request", n = i, request_id = %request_id);

            let outcome = tokio::select! {
                outcome = self.chain.invoke().instrument(span.clone()) => outcome,
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping driver");
                    break;
                }
            };

            span.in_scope(|| match &outcome {
                ChainOutcome::Served { dependency, payload } => {
                    report.served += 1;
                    tracing::info!(dependency = %dependency, response = %payload, "Request served");
                }
                ChainOutcome::Degraded(exhausted) => {
                    report.degraded += 1;
                    tracing::warn!(
                        response = %outcome.clone().into_payload(),
                        failures = exhausted.failures.len(),
                        "Request degraded"
                    );
                }
            });

            if i < self.iterations {
                tokio::select! {
                    _ = tokio::time::sleep(self.interval) => {}
                    _ = &mut shutdown => {
                        tracing::info!("Shutdown requested, stopping driver");
                        break;
                    }
                }
            }
        }

        tracing::info!(served = report.served, degraded = report.degraded, "Driver finished");
        report
    }
}
