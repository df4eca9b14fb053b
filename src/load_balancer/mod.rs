//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! select_endpoint()
//!     → pool.rs (snapshot of active + healthy endpoints)
//!     → Apply the configured algorithm:
//!         - round_robin.rs (rotate through candidates)
//!         - weighted.rs (random, proportional to weight)
//!         - least_loaded.rs (fewest recorded outcomes)
//!     → Return the endpoint or NoEndpointAvailable
//! ```
//!
//! # Design Decisions
//! - Strategies are pure functions over a candidate slice
//! - Inactive and non-healthy endpoints are excluded from selection
//! - Health probing is owned by the balancer but writes only endpoint atomics

pub mod balancer;
pub mod endpoint;
pub mod least_loaded;
pub mod pool;
pub mod round_robin;
pub mod weighted;

use std::time::Duration;
use serde::{Deserialize, Serialize};

pub use balancer::LoadBalancer;
pub use endpoint::{Endpoint, EndpointStatus, HealthStatus};
pub use pool::EndpointPool;

/// Endpoint selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancingAlgorithm {
    #[default]
    RoundRobin,
    WeightedRandom,
    LeastLoaded,
}

/// Load balancer configuration.
#[derive(Debug, Clone)]
pub struct LoadBalancerConfig {
    pub algorithm: LoadBalancingAlgorithm,
    pub health_check_interval: Duration,
    pub health_check_timeout: Duration,
    /// Probe retry defaults. Each health cycle still issues exactly one GET
    /// per endpoint; a failed probe is simply tried again next cycle.
    pub retry_count: u32,
    pub retry_delay: Duration,
}

impl Default for LoadBalancerConfig {
    fn default() -> Self {
        Self {
            algorithm: LoadBalancingAlgorithm::RoundRobin,
            health_check_interval: Duration::from_secs(30),
            health_check_timeout: Duration::from_secs(5),
            retry_count: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}
