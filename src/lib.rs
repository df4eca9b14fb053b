//! Failover orchestration core.
//!
//! A circuit breaker, a health-checking load balancer and an orchestrator
//! that runs caller operations against a pool of redundant endpoints with
//! bounded retries and backoff.
//!
//! ```text
//! caller → FailoverOrchestrator::execute_with_failover(op)
//!     → LoadBalancer::select_endpoint()
//!     → CircuitBreaker::call(op(endpoint))
//!     → result, or retry after backoff
//! ```

pub mod admin;
pub mod config;
pub mod discovery;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod orchestrator;
pub mod resilience;

pub use config::FailoverConfig;
pub use discovery::{EndpointDiscovery, StaticDiscovery};
pub use error::{BoxError, FailoverError};
pub use load_balancer::{Endpoint, LoadBalancer, LoadBalancerConfig, LoadBalancingAlgorithm};
pub use orchestrator::{FailoverOrchestrator, OrchestratorConfig, ServiceStatus};
pub use resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
