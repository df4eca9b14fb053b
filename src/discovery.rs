//! Sources of the initial endpoint set.
//!
//! The orchestrator does not discover services itself; it asks an
//! [`EndpointDiscovery`] collaborator once, on start.

use url::Url;

use crate::config::EndpointConfig;
use crate::load_balancer::endpoint::Endpoint;

/// Supplies the endpoints registered when an orchestrator starts.
pub trait EndpointDiscovery: Send + Sync {
    fn discover(&self) -> Vec<Endpoint>;
}

/// Endpoints listed in configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    endpoints: Vec<EndpointConfig>,
}

impl StaticDiscovery {
    pub fn new(endpoints: Vec<EndpointConfig>) -> Self {
        Self { endpoints }
    }
}

impl EndpointDiscovery for StaticDiscovery {
    fn discover(&self) -> Vec<Endpoint> {
        self.endpoints
            .iter()
            .filter_map(|config| match config.to_endpoint() {
                Ok(endpoint) => Some(endpoint),
                Err(e) => {
                    tracing::warn!(endpoint = %config.name, url = %config.url, error = %e, "Invalid endpoint url");
                    None
                }
            })
            .collect()
    }
}

/// Local bootstrap set used when no endpoints are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDiscovery;

impl EndpointDiscovery for DefaultDiscovery {
    fn discover(&self) -> Vec<Endpoint> {
        default_endpoints()
    }
}

/// Three local instances: `primary`, `secondary` and `backup` on ports
/// 8000–8002, with the primary weighted highest.
pub fn default_endpoints() -> Vec<Endpoint> {
    [("primary", 8000, 3), ("secondary", 8001, 2), ("backup", 8002, 1)]
        .into_iter()
        .filter_map(|(name, port, weight)| {
            let url = Url::parse("http://localhost").ok()?;
            Some(
                Endpoint::new(name, url, port, "/health")
                    .with_weight(weight)
                    .with_region("local"),
            )
        })
        .collect()
}

impl<F> EndpointDiscovery for F
where
    F: Fn() -> Vec<Endpoint> + Send + Sync,
{
    fn discover(&self) -> Vec<Endpoint> {
        self()
    }
}
