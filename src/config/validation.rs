//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds, attempts, timeouts > 0)
//! - Check dependency names are unique and URLs usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{BreakerConfig, ClientConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one dependency is required")]
    NoDependencies,

    #[error("dependency #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("dependency '{0}' is declared more than once")]
    DuplicateName(String),

    #[error("dependency '{name}' has invalid url '{url}': {reason}")]
    InvalidUrl { name: String, url: String, reason: String },

    #[error("dependency '{0}' must have timeout_secs > 0")]
    ZeroTimeout(String),

    #[error("{scope}: failure_threshold must be at least 1")]
    ZeroFailureThreshold { scope: String },

    #[error("{scope}: reset_timeout_secs must be > 0")]
    ZeroResetTimeout { scope: String },

    #[error("retry.max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("driver.iterations must be at least 1")]
    ZeroIterations,

    #[error("unknown log level '{0}'")]
    InvalidLogLevel(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration, collecting every problem found.
///
/// # Errors
/// Returns the full list of validation errors if any check fails.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.dependencies.is_empty() {
        errors.push(ValidationError::NoDependencies);
    }

    let mut seen = HashSet::new();
    for (index, dep) in config.dependencies.iter().enumerate() {
        if dep.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName { index });
        } else if !seen.insert(dep.name.as_str()) {
            errors.push(ValidationError::DuplicateName(dep.name.clone()));
        }

        if let Err(reason) = check_url(&dep.url) {
            errors.push(ValidationError::InvalidUrl {
                name: dep.name.clone(),
                url: dep.url.clone(),
                reason,
            });
        }

        if dep.timeout_secs == 0 {
            errors.push(ValidationError::ZeroTimeout(dep.name.clone()));
        }

        if let Some(breaker) = &dep.breaker {
            check_breaker(breaker, &format!("dependency '{}' breaker", dep.name), &mut errors);
        }
    }

    check_breaker(&config.breaker, "breaker", &mut errors);

    if config.retry.max_attempts == 0 {
        errors.push(ValidationError::ZeroAttempts);
    }

    if config.driver.iterations == 0 {
        errors.push(ValidationError::ZeroIterations);
    }

    let obs = &config.observability;
    if !LOG_LEVELS.contains(&obs.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(obs.log_level.clone()));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}

fn check_breaker(breaker: &BreakerConfig, scope: &str, errors: &mut Vec<ValidationError>) {
    if breaker.failure_threshold == 0 {
        errors.push(ValidationError::ZeroFailureThreshold { scope: scope.to_string() });
    }
    if breaker.reset_timeout_secs == 0 {
        errors.push(ValidationError::ZeroResetTimeout { scope: scope.to_string() });
    }
}
