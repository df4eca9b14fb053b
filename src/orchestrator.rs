//! Failover orchestration.
//!
//! # Data Flow
//! ```text
//! execute_with_failover(name, op, max_retries)
//!     → for each attempt:
//!         → LoadBalancer::select_endpoint()     (none → attempt failed)
//!         → CircuitBreaker::call(op(endpoint))   (open/timeout/error → attempt failed)
//!         → success → return
//!         → failure → sleep backoff(attempt), try again
//!     → AllRetriesExhausted { last error }
//! ```
//!
//! Each orchestrator is an independent value; nothing here is global.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use serde::Serialize;

use crate::config::FailoverConfig;
use crate::discovery::{DefaultDiscovery, EndpointDiscovery, StaticDiscovery};
use crate::error::{BoxError, FailoverError};
use crate::load_balancer::{Endpoint, EndpointStatus, LoadBalancer, LoadBalancerConfig};
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

/// Retry policy for [`FailoverOrchestrator::execute`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Point-in-time view of the orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    /// True when at least one active endpoint is healthy.
    pub healthy: bool,
    /// Active and healthy endpoints.
    pub active_endpoints: usize,
    pub total_endpoints: usize,
    pub circuit_breaker_state: CircuitState,
    pub endpoints: Vec<EndpointStatus>,
}

/// Runs caller operations against a pool of endpoints with circuit breaking,
/// retries and backoff.
pub struct FailoverOrchestrator {
    config: OrchestratorConfig,
    load_balancer: LoadBalancer,
    circuit_breaker: CircuitBreaker,
    discovery: Box<dyn EndpointDiscovery>,
    registered: AtomicBool,
}

impl FailoverOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        load_balancer: LoadBalancerConfig,
        circuit_breaker: CircuitBreakerConfig,
        discovery: impl EndpointDiscovery + 'static,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            config,
            load_balancer: LoadBalancer::new(load_balancer)?,
            circuit_breaker: CircuitBreaker::new(circuit_breaker),
            discovery: Box::new(discovery),
            registered: AtomicBool::new(false),
        })
    }

    /// Build from a loaded configuration. Falls back to the local default
    /// endpoints when none are configured.
    pub fn from_config(config: &FailoverConfig) -> Result<Self, reqwest::Error> {
        let orchestrator = config.orchestrator.to_runtime();
        let load_balancer = config.load_balancer.to_runtime();
        let circuit_breaker = config.circuit_breaker.to_runtime();

        let built = if config.endpoints.is_empty() {
            tracing::info!("No endpoints configured, using default bootstrap set");
            Self::new(orchestrator, load_balancer, circuit_breaker, DefaultDiscovery)?
        } else {
            let discovery = StaticDiscovery::new(config.endpoints.clone());
            Self::new(orchestrator, load_balancer, circuit_breaker, discovery)?
        };
        Ok(built.with_name(&config.orchestrator.name))
    }

    /// Name this orchestrator's circuit breaker, which labels its state
    /// gauge. Unnamed orchestrators report as `default`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let config = self.circuit_breaker.config().clone();
        self.circuit_breaker = CircuitBreaker::named(name, config);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn load_balancer(&self) -> &LoadBalancer {
        &self.load_balancer
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    /// Register the discovered endpoints (first call only) and start health
    /// checks. Must be called from within a Tokio runtime.
    pub fn start(&self) {
        if !self.registered.swap(true, Ordering::SeqCst) {
            let endpoints = self.discovery.discover();
            tracing::info!(count = endpoints.len(), "Registering initial endpoints");
            for endpoint in endpoints {
                self.load_balancer.add_endpoint(endpoint);
            }
        }
        self.load_balancer.start_health_checks();
    }

    /// Stop health checks and wait for the loop to exit.
    pub async fn stop(&self) {
        self.load_balancer.stop_health_checks().await;
        tracing::info!("Failover orchestrator stopped");
    }

    /// [`execute_with_failover`](Self::execute_with_failover) with the
    /// configured retry budget.
    pub async fn execute<T, F, Fut>(&self, operation_name: &str, operation: F) -> Result<T, FailoverError>
    where
        F: Fn(Arc<Endpoint>) -> Fut,
        Fut: Future<Output = Result<T, BoxError>>,
    {
        self.execute_with_failover(operation_name, operation, self.config.max_retries)
            .await
    }

    /// Run `operation` against a selected endpoint, retrying up to
    /// `max_retries` attempts in total. Only the terminal error is returned.
    pub async fn execute_with_failover<T, F, Fut>(
        &self,
        operation_name: &str,
        operation: F,
        max_retries: u32,
    ) -> Result<T, FailoverError>
    where
        F: Fn(Arc<Endpoint>) -> Fut,
        Fut: Future<Output = Result<T, BoxError>>,
    {
        let mut last_error = None;

        for attempt in 0..max_retries {
            metrics::record_attempt(operation_name);

            let outcome = match self.load_balancer.select_endpoint() {
                Ok(endpoint) => {
                    tracing::debug!(operation = %operation_name, attempt, endpoint = %endpoint.name(), "Executing operation");
                    self.circuit_breaker.call(|| operation(endpoint)).await
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(operation = %operation_name, attempt, "Operation succeeded after failover");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(operation = %operation_name, attempt, error = %e, "Attempt failed");
                    last_error = Some(e);

                    if attempt + 1 < max_retries {
                        let delay = calculate_backoff(attempt, self.config.base_backoff, self.config.max_backoff);
                        tracing::info!(operation = %operation_name, attempt, delay = ?delay, "Retrying after backoff");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        metrics::record_exhausted(operation_name);
        tracing::error!(operation = %operation_name, attempts = max_retries, "All attempts failed");

        Err(FailoverError::AllRetriesExhausted {
            attempts: max_retries,
            last: last_error.map(Box::new),
        })
    }

    /// Snapshot of endpoint health and breaker state. Has no side effects.
    pub fn service_status(&self) -> ServiceStatus {
        let endpoints = self.load_balancer.endpoints();
        let active_endpoints = endpoints.iter().filter(|e| e.is_available()).count();

        ServiceStatus {
            healthy: active_endpoints > 0,
            active_endpoints,
            total_endpoints: endpoints.len(),
            circuit_breaker_state: self.circuit_breaker.state(),
            endpoints: endpoints.iter().map(|e| e.snapshot()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use url::Url;

    fn endpoints(names: &'static [&'static str]) -> impl Fn() -> Vec<Endpoint> + Send + Sync {
        move || {
            names
                .iter()
                .map(|name| Endpoint::new(*name, Url::parse("http://127.0.0.1").unwrap(), 1, "/health"))
                .collect()
        }
    }

    fn orchestrator(threshold: u32) -> FailoverOrchestrator {
        FailoverOrchestrator::new(
            OrchestratorConfig {
                max_retries: 3,
                base_backoff: Duration::from_millis(10),
                max_backoff: Duration::from_millis(50),
            },
            LoadBalancerConfig::default(),
            CircuitBreakerConfig {
                failure_threshold: threshold,
                recovery_timeout: Duration::ZERO,
                call_timeout: Duration::from_secs(1),
                half_open_max_calls: 1,
            },
            endpoints(&["a", "b", "c"]),
        )
        .unwrap()
    }

    /// Register endpoints without spawning the health loop, then mark them healthy.
    fn register_healthy(orch: &FailoverOrchestrator) {
        orch.registered.store(true, Ordering::SeqCst);
        for endpoint in orch.discovery.discover() {
            endpoint.mark_success(Duration::from_millis(1));
            orch.load_balancer.add_endpoint(endpoint);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds() {
        let orch = orchestrator(2);
        register_healthy(&orch);

        let calls = AtomicU32::new(0);
        let seen = std::sync::Mutex::new(Vec::new());
        let result = orch
            .execute_with_failover(
                "charge",
                |endpoint| {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    seen.lock().unwrap().push(endpoint.name().to_string());
                    async move {
                        if n < 2 {
                            Err::<&str, BoxError>("backend error".into())
                        } else {
                            Ok("done")
                        }
                    }
                },
                3,
            )
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*seen.lock().unwrap(), ["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_wraps_last_error() {
        let orch = orchestrator(10);
        register_healthy(&orch);

        let result: Result<(), _> = orch
            .execute("sync", |_| async { Err::<(), BoxError>("still down".into()) })
            .await;

        match result {
            Err(FailoverError::AllRetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(last.as_deref(), Some(FailoverError::OperationFailed(e)) if e.to_string() == "still down"));
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_endpoint_consumes_retry_budget() {
        let orch = orchestrator(2);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = orch
            .execute_with_failover(
                "lookup",
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(()) }
                },
                2,
            )
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err.last_error(), Some(FailoverError::NoEndpointAvailable)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_retries_is_generic_failure() {
        let orch = orchestrator(2);
        register_healthy(&orch);

        let result: Result<(), _> = orch.execute_with_failover("noop", |_| async { Ok(()) }, 0).await;
        let err = result.unwrap_err();
        assert!(matches!(err, FailoverError::AllRetriesExhausted { attempts: 0, last: None }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_circuit_surfaces_as_last_error() {
        let orch = FailoverOrchestrator::new(
            OrchestratorConfig {
                max_retries: 3,
                base_backoff: Duration::from_millis(10),
                max_backoff: Duration::from_millis(10),
            },
            LoadBalancerConfig::default(),
            CircuitBreakerConfig {
                failure_threshold: 1,
                recovery_timeout: Duration::from_secs(3600),
                call_timeout: Duration::from_secs(1),
                half_open_max_calls: 1,
            },
            endpoints(&["only"]),
        )
        .unwrap();
        register_healthy(&orch);

        let calls = AtomicU32::new(0);
        let result: Result<(), _> = orch
            .execute("write", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), BoxError>("rejected".into()) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result.unwrap_err().last_error(), Some(FailoverError::CircuitOpen)));
        assert_eq!(orch.service_status().circuit_breaker_state, CircuitState::Open);
    }

    #[test]
    fn test_service_status() {
        let orch = orchestrator(2);
        register_healthy(&orch);
        let endpoints = orch.load_balancer().endpoints();
        endpoints[1].mark_failure(None);

        let status = orch.service_status();
        assert!(status.healthy);
        assert_eq!(status.active_endpoints, 2);
        assert_eq!(status.total_endpoints, 3);
        assert_eq!(status.circuit_breaker_state, CircuitState::Closed);
        assert_eq!(status.endpoints[1].name, "b");
        assert_eq!(status.endpoints[1].error_count, 1);
        assert_eq!(status.endpoints[0].success_count, 1);
    }

    #[test]
    fn test_service_status_unhealthy_when_only_inactive_healthy() {
        let orch = orchestrator(2);
        register_healthy(&orch);
        for endpoint in orch.load_balancer().endpoints().iter() {
            endpoint.set_active(false);
        }
        let status = orch.service_status();
        assert!(!status.healthy);
        assert_eq!(status.active_endpoints, 0);
    }

    #[test]
    fn test_named_breaker() {
        assert_eq!(orchestrator(2).circuit_breaker().name(), "default");

        let orch = orchestrator(4).with_name("payments");
        assert_eq!(orch.circuit_breaker().name(), "payments");
        assert_eq!(orch.circuit_breaker().config().failure_threshold, 4);
    }

    #[test]
    fn test_from_config_uses_orchestrator_name() {
        let mut config = FailoverConfig::default();
        config.orchestrator.name = "billing".to_string();
        let orch = FailoverOrchestrator::from_config(&config).unwrap();
        assert_eq!(orch.circuit_breaker().name(), "billing");
    }

    #[tokio::test]
    async fn test_start_registers_once() {
        let orch = orchestrator(2);
        orch.start();
        orch.start();
        assert_eq!(orch.load_balancer().endpoints().len(), 3);
        assert!(orch.load_balancer().health_checks_running());

        orch.stop().await;
        orch.stop().await;
        assert!(!orch.load_balancer().health_checks_running());
    }
}
