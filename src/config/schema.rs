//! Configuration schema definitions.
//!
//! This module defines the file-level configuration structure. All types
//! derive Serde traits for deserialization from config files; durations are
//! written as integer `_secs` / `_ms` fields and converted with
//! `to_runtime()`.

use std::time::Duration;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::load_balancer::{Endpoint, LoadBalancerConfig, LoadBalancingAlgorithm};
use crate::orchestrator::OrchestratorConfig;
use crate::resilience::circuit_breaker::CircuitBreakerConfig;

/// Root configuration for the failover service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FailoverConfig {
    /// Backend endpoint definitions.
    pub endpoints: Vec<EndpointConfig>,

    /// Circuit breaker settings.
    pub circuit_breaker: CircuitBreakerSettings,

    /// Selection and health check settings.
    pub load_balancer: LoadBalancerSettings,

    /// Orchestrator retry settings.
    pub orchestrator: RetrySettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Status API settings.
    pub admin: AdminConfig,
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Unique endpoint name.
    pub name: String,

    /// Base URL (e.g., "http://10.0.0.5").
    pub url: String,

    /// Port the endpoint listens on.
    pub port: u16,

    /// Path probed by health checks.
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Weight for weighted-random selection (default: 1).
    #[serde(default = "default_weight")]
    pub weight: u32,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub zone: Option<String>,

    /// Administratively enabled.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_weight() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

impl EndpointConfig {
    pub fn to_endpoint(&self) -> Result<Endpoint, url::ParseError> {
        let url = Url::parse(&self.url)?;
        let mut endpoint = Endpoint::new(&self.name, url, self.port, &self.health_path)
            .with_weight(self.weight)
            .with_active(self.active);
        if let Some(region) = &self.region {
            endpoint = endpoint.with_region(region);
        }
        if let Some(zone) = &self.zone {
            endpoint = endpoint.with_zone(zone);
        }
        Ok(endpoint)
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// Seconds to wait after the last failure before a trial call.
    pub recovery_timeout_secs: u64,

    /// Per-call deadline in milliseconds.
    pub call_timeout_ms: u64,

    /// Consecutive trial successes needed to close the circuit.
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_secs: 60,
            call_timeout_ms: 30_000,
            half_open_max_calls: 3,
        }
    }
}

impl CircuitBreakerSettings {
    pub fn to_runtime(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            recovery_timeout: Duration::from_secs(self.recovery_timeout_secs),
            call_timeout: Duration::from_millis(self.call_timeout_ms),
            half_open_max_calls: self.half_open_max_calls,
        }
    }
}

/// Load balancer and health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadBalancerSettings {
    /// Selection algorithm (round_robin, weighted_random, least_loaded).
    pub algorithm: LoadBalancingAlgorithm,

    /// Health check interval in seconds.
    pub health_check_interval_secs: u64,

    /// Health probe timeout in milliseconds.
    pub health_check_timeout_ms: u64,

    /// Probe retry default. Probes are not repeated within a cycle.
    pub retry_count: u32,

    /// Probe retry delay default in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for LoadBalancerSettings {
    fn default() -> Self {
        Self {
            algorithm: LoadBalancingAlgorithm::RoundRobin,
            health_check_interval_secs: 30,
            health_check_timeout_ms: 5_000,
            retry_count: 3,
            retry_delay_ms: 1_000,
        }
    }
}

impl LoadBalancerSettings {
    pub fn to_runtime(&self) -> LoadBalancerConfig {
        LoadBalancerConfig {
            algorithm: self.algorithm,
            health_check_interval: Duration::from_secs(self.health_check_interval_secs),
            health_check_timeout: Duration::from_millis(self.health_check_timeout_ms),
            retry_count: self.retry_count,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Orchestrator retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Orchestrator name, carried as the circuit breaker's metric label.
    pub name: String,

    /// Total attempts per execution.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_backoff_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_retries: 3,
            base_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
        }
    }
}

impl RetrySettings {
    pub fn to_runtime(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_retries: self.max_retries,
            base_backoff: Duration::from_millis(self.base_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Status API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the status API.
    pub enabled: bool,

    /// Status API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
