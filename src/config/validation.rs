//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds ≥ 1, timeouts > 0, ports valid)
//! - Check endpoint definitions (unique names, parsable urls)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FailoverConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::config::schema::FailoverConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &FailoverConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let cb = &config.circuit_breaker;
    if cb.failure_threshold == 0 {
        errors.push(ValidationError::new("circuit_breaker.failure_threshold", "must be at least 1"));
    }
    if cb.half_open_max_calls == 0 {
        errors.push(ValidationError::new("circuit_breaker.half_open_max_calls", "must be at least 1"));
    }
    if cb.call_timeout_ms == 0 {
        errors.push(ValidationError::new("circuit_breaker.call_timeout_ms", "must be greater than 0"));
    }

    let lb = &config.load_balancer;
    if lb.health_check_interval_secs == 0 {
        errors.push(ValidationError::new("load_balancer.health_check_interval_secs", "must be greater than 0"));
    }
    if lb.health_check_timeout_ms == 0 {
        errors.push(ValidationError::new("load_balancer.health_check_timeout_ms", "must be greater than 0"));
    }

    let retry = &config.orchestrator;
    if retry.name.is_empty() {
        errors.push(ValidationError::new("orchestrator.name", "must not be empty"));
    }
    if retry.max_retries == 0 {
        errors.push(ValidationError::new("orchestrator.max_retries", "must be at least 1"));
    }
    if retry.base_backoff_ms > retry.max_backoff_ms {
        errors.push(ValidationError::new(
            "orchestrator.base_backoff_ms",
            "must not exceed orchestrator.max_backoff_ms",
        ));
    }

    let mut names = HashSet::new();
    for (i, endpoint) in config.endpoints.iter().enumerate() {
        let field = |name: &str| format!("endpoints[{}].{}", i, name);

        if endpoint.name.is_empty() {
            errors.push(ValidationError::new(field("name"), "must not be empty"));
        } else if !names.insert(endpoint.name.as_str()) {
            errors.push(ValidationError::new(field("name"), format!("duplicate endpoint name '{}'", endpoint.name)));
        }

        match Url::parse(&endpoint.url) {
            Ok(url) if url.cannot_be_a_base() || url.host().is_none() => {
                errors.push(ValidationError::new(field("url"), "must include a host"));
            }
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::new(field("url"), e.to_string())),
        }

        if endpoint.port == 0 {
            errors.push(ValidationError::new(field("port"), "must be greater than 0"));
        }
        if !endpoint.health_path.starts_with('/') {
            errors.push(ValidationError::new(field("health_path"), "must start with '/'"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::EndpointConfig;

    fn endpoint(name: &str, url: &str) -> EndpointConfig {
        EndpointConfig {
            name: name.into(),
            url: url.into(),
            port: 8080,
            health_path: "/health".into(),
            weight: 1,
            region: None,
            zone: None,
            active: true,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&FailoverConfig::default()).is_ok());
    }

    #[test]
    fn test_orchestrator_name_required() {
        let mut config = FailoverConfig::default();
        config.orchestrator.name.clear();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "orchestrator.name");
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = FailoverConfig::default();
        config.circuit_breaker.failure_threshold = 0;
        config.orchestrator.base_backoff_ms = 60_000;
        config.endpoints.push(endpoint("a", "http://10.0.0.1"));
        config.endpoints.push(endpoint("a", "mailto:ops@example.com"));
        config.endpoints[1].port = 0;
        config.endpoints[1].health_path = "health".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "circuit_breaker.failure_threshold",
                "orchestrator.base_backoff_ms",
                "endpoints[1].name",
                "endpoints[1].url",
                "endpoints[1].port",
                "endpoints[1].health_path",
            ]
        );
    }

    #[test]
    fn test_unparsable_url() {
        let mut config = FailoverConfig::default();
        config.endpoints.push(endpoint("a", "::not a url::"));
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "endpoints[0].url");
    }
}
