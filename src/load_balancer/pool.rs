//! Endpoint pool management.
//!
//! # Responsibilities
//! - Hold the registered endpoints in insertion order
//! - Serialize structural changes (add/remove) under a mutex
//! - Give readers a lock-free snapshot for selection and probing

use std::sync::{Arc, Mutex, PoisonError};
use arc_swap::ArcSwap;
use uuid::Uuid;

use crate::load_balancer::endpoint::Endpoint;

/// Registry of endpoints.
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: ArcSwap<Vec<Arc<Endpoint>>>,
    /// Held by writers so concurrent add/remove never lose an update.
    write_lock: Mutex<()>,
}

impl EndpointPool {
    pub fn new() -> Self {
        Self {
            endpoints: ArcSwap::from_pointee(Vec::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Register an endpoint at the end of the list.
    pub fn add(&self, endpoint: Arc<Endpoint>) {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = Vec::clone(&self.endpoints.load());
        tracing::info!(endpoint = %endpoint.name(), id = %endpoint.id(), "Endpoint registered");
        next.push(endpoint);
        self.endpoints.store(Arc::new(next));
    }

    /// Remove an endpoint by id. Returns the removed endpoint, if any.
    pub fn remove(&self, id: Uuid) -> Option<Arc<Endpoint>> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.endpoints.load();
        let position = current.iter().position(|e| e.id() == id)?;

        let mut next = Vec::clone(&current);
        let removed = next.remove(position);
        self.endpoints.store(Arc::new(next));

        tracing::info!(endpoint = %removed.name(), id = %id, "Endpoint removed");
        Some(removed)
    }

    /// Snapshot of all endpoints.
    pub fn endpoints(&self) -> Arc<Vec<Arc<Endpoint>>> {
        self.endpoints.load_full()
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<Endpoint>> {
        self.endpoints.load().iter().find(|e| e.id() == id).cloned()
    }

    /// Active endpoints whose last probe was healthy, in list order.
    pub fn available(&self) -> Vec<Arc<Endpoint>> {
        self.endpoints
            .load()
            .iter()
            .filter(|e| e.is_available())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.endpoints.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EndpointPool {
    fn default() -> Self {
        Self::new()
    }
}
