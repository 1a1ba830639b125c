//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the failover client.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Dependencies in fallback priority order.
    pub dependencies: Vec<DependencyConfig>,

    /// Breaker settings applied to every dependency without an override.
    pub breaker: BreakerConfig,

    /// Retry policy shared by all dependencies.
    pub retry: RetryConfig,

    /// Driving loop settings.
    pub driver: DriverConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            dependencies: vec![
                DependencyConfig::new("service_a", "http://localhost:5001/data"),
                DependencyConfig::new("service_b", "http://localhost:5002/data"),
            ],
            breaker: BreakerConfig::default(),
            retry: RetryConfig::default(),
            driver: DriverConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// A remote dependency reached over HTTP.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DependencyConfig {
    /// Unique identifier, also the metrics label.
    pub name: String,

    /// Endpoint fetched with GET.
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Per-dependency breaker override.
    #[serde(default)]
    pub breaker: Option<BreakerConfig>,
}

impl DependencyConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            timeout_secs: default_timeout_secs(),
            breaker: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    3
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,

    /// Seconds an open circuit waits before admitting a trial call.
    pub reset_timeout_secs: u64,
}

impl BreakerConfig {
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_timeout_secs)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 2,
            reset_timeout_secs: 10,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds.
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay_ms: 2000,
        }
    }
}

/// Driving loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DriverConfig {
    /// Number of chain invocations.
    pub iterations: u32,

    /// Pause between invocations in seconds.
    pub interval_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            iterations: 20,
            interval_secs: 3,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:8001".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.dependencies.len(), 2);
        assert_eq!(config.breaker.failure_threshold, 2);
        assert_eq!(config.retry.delay_ms, 2000);
    }

    #[test]
    fn test_dependency_overrides() {
        let doc = r#"
            [[dependencies]]
            name = "primary"
            url = "http://10.0.0.1/data"

            [[dependencies]]
            name = "backup"
            url = "http://10.0.0.2/data"
            timeout_secs = 1

            [dependencies.breaker]
            failure_threshold = 5
        "#;
        let config: ClientConfig = toml::from_str(doc).unwrap();

        assert_eq!(config.dependencies[0].timeout(), Duration::from_secs(3));
        assert!(config.dependencies[0].breaker.is_none());

        let backup = &config.dependencies[1];
        assert_eq!(backup.timeout_secs, 1);
        let breaker = backup.breaker.as_ref().unwrap();
        assert_eq!(breaker.failure_threshold, 5);
        assert_eq!(breaker.reset_timeout_secs, 10);
    }

    #[test]
    fn test_log_format_lowercase() {
        let config: ObservabilityConfig = toml::from_str("log_format = \"json\"").unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(toml::from_str::<ObservabilityConfig>("log_format = \"xml\"").is_err());
    }
}
