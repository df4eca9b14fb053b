//! Endpoint abstraction.
//!
//! # Responsibilities
//! - Represent a single backend instance
//! - Track health status and probe metrics (latency, success/error counts)
//! - Carry administrative state (active flag, weight, region/zone labels)
//!
//! Counters only ever increase. Status and metrics are written by the health
//! monitor; everything else is fixed at construction except `active`.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Sentinel for "not recorded" in the atomic metric slots.
const UNSET: u64 = u64::MAX;

/// Health status enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Unknown = 0,
    Healthy = 1,
    Degraded = 2,
    Unhealthy = 3,
}

impl From<u8> for HealthStatus {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthStatus::Healthy,
            2 => HealthStatus::Degraded,
            3 => HealthStatus::Unhealthy,
            _ => HealthStatus::Unknown,
        }
    }
}

/// A single backend instance.
#[derive(Debug)]
pub struct Endpoint {
    id: Uuid,
    name: String,
    url: Url,
    port: u16,
    health_path: String,
    weight: u32,
    region: Option<String>,
    zone: Option<String>,
    created_at: SystemTime,

    active: AtomicBool,
    status: AtomicU8,
    /// Unix millis of the last completed probe.
    last_check_ms: AtomicU64,
    /// Latency of the last probe that produced a response, in microseconds.
    last_latency_us: AtomicU64,
    error_count: AtomicU64,
    success_count: AtomicU64,
}

impl Endpoint {
    /// Create a new, active endpoint with weight 1 and `Unknown` status.
    pub fn new(name: impl Into<String>, url: Url, port: u16, health_path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            url,
            port,
            health_path: health_path.into(),
            weight: 1,
            region: None,
            zone: None,
            created_at: SystemTime::now(),
            active: AtomicBool::new(true),
            status: AtomicU8::new(HealthStatus::Unknown as u8),
            last_check_ms: AtomicU64::new(UNSET),
            last_latency_us: AtomicU64::new(UNSET),
            error_count: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_active(self, active: bool) -> Self {
        self.active.store(active, Ordering::Relaxed);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn health_path(&self) -> &str {
        &self.health_path
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Base address of the endpoint with its port applied.
    pub fn base_url(&self) -> Url {
        let mut url = self.url.clone();
        // Only fails for cannot-be-a-base urls, which never pass config validation.
        let _ = url.set_port(Some(self.port));
        url
    }

    /// Address probed by the health monitor: `{url}:{port}{health_path}`.
    pub fn probe_url(&self) -> Url {
        let mut url = self.base_url();
        url.set_path(&self.health_path);
        url
    }

    // --- Administrative state ---

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    /// Active and last probed healthy.
    pub fn is_available(&self) -> bool {
        self.is_active() && self.status() == HealthStatus::Healthy
    }

    // --- Health metrics ---

    pub fn status(&self) -> HealthStatus {
        HealthStatus::from(self.status.load(Ordering::Relaxed))
    }

    pub fn set_status(&self, status: HealthStatus) {
        self.status.store(status as u8, Ordering::Relaxed);
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Total probe outcomes recorded, used by least-loaded selection.
    pub fn load(&self) -> u64 {
        self.success_count().saturating_add(self.error_count())
    }

    pub fn last_latency(&self) -> Option<Duration> {
        match self.last_latency_us.load(Ordering::Relaxed) {
            UNSET => None,
            us => Some(Duration::from_micros(us)),
        }
    }

    pub fn last_check(&self) -> Option<SystemTime> {
        match self.last_check_ms.load(Ordering::Relaxed) {
            UNSET => None,
            ms => Some(UNIX_EPOCH + Duration::from_millis(ms)),
        }
    }

    /// Report a successful probe.
    pub fn mark_success(&self, latency: Duration) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
        self.last_latency_us.store(latency.as_micros().min(UNSET as u128 - 1) as u64, Ordering::Relaxed);
        self.touch();
        self.set_status(HealthStatus::Healthy);
    }

    /// Report a failed probe. `latency` is `None` when no response arrived.
    pub fn mark_failure(&self, latency: Option<Duration>) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
        let us = latency.map_or(UNSET, |l| l.as_micros().min(UNSET as u128 - 1) as u64);
        self.last_latency_us.store(us, Ordering::Relaxed);
        self.touch();
        self.set_status(HealthStatus::Unhealthy);
    }

    fn touch(&self) {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.last_check_ms.store(now_ms, Ordering::Relaxed);
    }

    /// Point-in-time view of the endpoint.
    pub fn snapshot(&self) -> EndpointStatus {
        EndpointStatus {
            id: self.id,
            name: self.name.clone(),
            url: self.base_url().to_string(),
            status: self.status(),
            active: self.is_active(),
            weight: self.weight,
            region: self.region.clone(),
            zone: self.zone.clone(),
            last_latency_ms: self.last_latency().map(|l| l.as_secs_f64() * 1000.0),
            last_check_unix_ms: self
                .last_check()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64),
            created_at_unix_ms: self
                .created_at()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_millis() as u64),
            success_count: self.success_count(),
            error_count: self.error_count(),
        }
    }
}

/// Serializable per-endpoint metrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointStatus {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub status: HealthStatus,
    pub active: bool,
    pub weight: u32,
    pub region: Option<String>,
    pub zone: Option<String>,
    pub last_latency_ms: Option<f64>,
    pub last_check_unix_ms: Option<u64>,
    pub created_at_unix_ms: u64,
    pub success_count: u64,
    pub error_count: u64,
}
