//! Metrics collection and exposition.
//!
//! # Metrics
//! - `failover_attempts_total` (counter): attempts by operation
//! - `failover_exhausted_total` (counter): executions that ran out of retries
//! - `failover_endpoint_health` (gauge): 1=available, 0=not, by endpoint
//! - `failover_circuit_state` (gauge): 0=closed, 1=half_open, 2=open, by breaker

use std::net::SocketAddr;
use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus recorder with its own HTTP listener.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_attempt(operation: &str) {
    counter!("failover_attempts_total", "operation" => operation.to_string()).increment(1);
}

pub fn record_exhausted(operation: &str) {
    counter!("failover_exhausted_total", "operation" => operation.to_string()).increment(1);
}

pub fn record_endpoint_health(endpoint: &str, available: bool) {
    gauge!("failover_endpoint_health", "endpoint" => endpoint.to_string())
        .set(if available { 1.0 } else { 0.0 });
}

pub fn record_circuit_state(breaker: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    gauge!("failover_circuit_state", "breaker" => breaker.to_string()).set(value);
}
