//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe endpoints
//! - Update endpoint health state based on results

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use futures_util::future::{join_all, FutureExt};
use reqwest::StatusCode;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::load_balancer::endpoint::Endpoint;
use crate::load_balancer::pool::EndpointPool;
use crate::observability::metrics;

/// Upper bound on the pause after a cycle that died unexpectedly.
const FALLBACK_DELAY: Duration = Duration::from_secs(1);

/// Result of probing a single endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The endpoint answered 200.
    Healthy { latency: Duration },
    /// The endpoint answered with some other status.
    BadStatus { status: u16, latency: Duration },
    /// No response: connection error or timeout.
    Unreachable { reason: String },
}

/// Issues health probes.
#[derive(Debug, Clone)]
pub struct HealthProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl HealthProber {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent("failover-health-check")
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()?;

        Ok(Self { client, timeout })
    }

    /// Send a single GET to the endpoint's probe url, bounded by the timeout.
    pub async fn probe(&self, endpoint: &Endpoint) -> ProbeOutcome {
        let url = endpoint.probe_url();
        let started = Instant::now();

        match time::timeout(self.timeout, self.client.get(url).send()).await {
            Ok(Ok(response)) => {
                let latency = started.elapsed();
                let status = response.status();
                if status == StatusCode::OK {
                    ProbeOutcome::Healthy { latency }
                } else {
                    tracing::warn!(endpoint = %endpoint.name(), status = %status, "Health check failed: non-200 status");
                    ProbeOutcome::BadStatus { status: status.as_u16(), latency }
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(endpoint = %endpoint.name(), error = %e, "Health check failed: connection error");
                ProbeOutcome::Unreachable { reason: e.to_string() }
            }
            Err(_) => {
                tracing::warn!(endpoint = %endpoint.name(), timeout = ?self.timeout, "Health check failed: timeout");
                ProbeOutcome::Unreachable { reason: format!("timed out after {:?}", self.timeout) }
            }
        }
    }

    /// Probe every active endpoint concurrently and apply the outcomes.
    pub async fn check_all(&self, endpoints: &[Arc<Endpoint>]) {
        let probes = endpoints
            .iter()
            .filter(|e| e.is_active())
            .map(|endpoint| async move {
                let outcome = self.probe(endpoint).await;
                apply_outcome(endpoint, &outcome);
            });

        join_all(probes).await;
    }
}

/// Record a probe outcome on the endpoint.
pub fn apply_outcome(endpoint: &Endpoint, outcome: &ProbeOutcome) {
    let was = endpoint.status();
    match outcome {
        ProbeOutcome::Healthy { latency } => endpoint.mark_success(*latency),
        ProbeOutcome::BadStatus { latency, .. } => endpoint.mark_failure(Some(*latency)),
        ProbeOutcome::Unreachable { .. } => endpoint.mark_failure(None),
    }

    let now = endpoint.status();
    if was != now {
        tracing::info!(endpoint = %endpoint.name(), from = ?was, to = ?now, "Endpoint health changed");
    }
    metrics::record_endpoint_health(endpoint.name(), endpoint.is_available());
}

/// Background loop that keeps endpoint health fresh.
pub struct HealthMonitor {
    pool: Arc<EndpointPool>,
    prober: HealthProber,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(pool: Arc<EndpointPool>, prober: HealthProber, interval: Duration) -> Self {
        Self {
            pool,
            prober,
            interval,
        }
    }

    /// Run cycles until `cancel` fires. In-flight probes are dropped on
    /// cancellation.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(interval = ?self.interval, "Health monitor starting");

        let pool = &self.pool;
        let prober = &self.prober;
        run_cycles(self.interval, cancel, move || {
            let endpoints = pool.endpoints();
            async move { prober.check_all(&endpoints).await }
        })
        .await;

        tracing::info!("Health monitor received stop signal, exiting loop");
    }
}

/// Drive `cycle` every `interval` until cancelled. A panicking cycle is
/// followed by a shorter pause of at most [`FALLBACK_DELAY`].
async fn run_cycles<F, Fut>(interval: Duration, cancel: CancellationToken, mut cycle: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        let run = AssertUnwindSafe(async { cycle().await }).catch_unwind();

        let delay = tokio::select! {
            _ = cancel.cancelled() => break,
            outcome = run => match outcome {
                Ok(()) => interval,
                Err(_) => {
                    tracing::error!("Health check cycle panicked, retrying shortly");
                    FALLBACK_DELAY.min(interval)
                }
            },
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = time::sleep(delay) => {}
        }
    }
}
