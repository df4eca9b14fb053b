//! The load balancer: registry, selection and health-check lifecycle.

use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::FailoverError;
use crate::health::active::{HealthMonitor, HealthProber};
use crate::load_balancer::{
    endpoint::Endpoint,
    least_loaded,
    pool::EndpointPool,
    round_robin,
    weighted,
    LoadBalancerConfig,
    LoadBalancingAlgorithm,
};

struct HealthTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Maintains the endpoint set, keeps health fresh and picks endpoints.
pub struct LoadBalancer {
    config: LoadBalancerConfig,
    pool: Arc<EndpointPool>,
    prober: HealthProber,
    cursor: AtomicUsize,
    health_task: Mutex<Option<HealthTask>>,
}

impl LoadBalancer {
    pub fn new(config: LoadBalancerConfig) -> Result<Self, reqwest::Error> {
        let prober = HealthProber::new(config.health_check_timeout)?;

        Ok(Self {
            config,
            pool: Arc::new(EndpointPool::new()),
            prober,
            cursor: AtomicUsize::new(0),
            health_task: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &LoadBalancerConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<EndpointPool> {
        &self.pool
    }

    pub fn add_endpoint(&self, endpoint: Endpoint) -> Arc<Endpoint> {
        let endpoint = Arc::new(endpoint);
        self.pool.add(endpoint.clone());
        endpoint
    }

    /// Remove by id. Removing an unknown id is a no-op.
    pub fn remove_endpoint(&self, id: Uuid) -> bool {
        self.pool.remove(id).is_some()
    }

    pub fn get_endpoint(&self, id: Uuid) -> Option<Arc<Endpoint>> {
        self.pool.get(id)
    }

    pub fn endpoints(&self) -> Arc<Vec<Arc<Endpoint>>> {
        self.pool.endpoints()
    }

    /// Pick the next endpoint among active, healthy ones.
    pub fn select_endpoint(&self) -> Result<Arc<Endpoint>, FailoverError> {
        let candidates = self.pool.available();

        let selected = match self.config.algorithm {
            LoadBalancingAlgorithm::RoundRobin => round_robin::select(&candidates, &self.cursor),
            LoadBalancingAlgorithm::WeightedRandom => weighted::select(&candidates),
            LoadBalancingAlgorithm::LeastLoaded => least_loaded::select(&candidates),
        };

        selected.ok_or_else(|| {
            tracing::debug!(
                total = self.pool.len(),
                algorithm = ?self.config.algorithm,
                "No healthy endpoints available"
            );
            FailoverError::NoEndpointAvailable
        })
    }

    /// (active and healthy, total) endpoint counts.
    pub fn health_summary(&self) -> (usize, usize) {
        let endpoints = self.pool.endpoints();
        let healthy = endpoints.iter().filter(|e| e.is_available()).count();
        (healthy, endpoints.len())
    }

    /// Run one probe cycle over all active endpoints and wait for it.
    pub async fn check_health_once(&self) {
        let endpoints = self.pool.endpoints();
        self.prober.check_all(&endpoints).await;
    }

    /// Spawn the periodic health loop. Calling it again while running does
    /// nothing. Must be called from within a Tokio runtime.
    pub fn start_health_checks(&self) {
        let mut task = self.health_task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            tracing::debug!("Health checks already running");
            return;
        }

        let cancel = CancellationToken::new();
        let monitor = HealthMonitor::new(
            self.pool.clone(),
            self.prober.clone(),
            self.config.health_check_interval,
        );
        let handle = tokio::spawn(monitor.run(cancel.clone()));

        *task = Some(HealthTask { cancel, handle });
    }

    /// Cancel the health loop and wait until it has exited.
    pub async fn stop_health_checks(&self) {
        let task = self
            .health_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(HealthTask { cancel, handle }) = task {
            cancel.cancel();
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Health monitor task ended abnormally");
            }
        }
    }

    pub fn health_checks_running(&self) -> bool {
        self.health_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }
}

impl Drop for LoadBalancer {
    fn drop(&mut self) {
        let task = self.health_task.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = task.take() {
            task.cancel.cancel();
        }
    }
}
