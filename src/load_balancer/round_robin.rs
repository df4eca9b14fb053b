//! Round-robin load balancing strategy.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use crate::load_balancer::endpoint::Endpoint;

/// Pick `candidates[cursor % len]` and advance the cursor.
///
/// The cursor is shared across calls and never reset when membership
/// changes, so a removal may shift the rotation by one.
pub fn select(candidates: &[Arc<Endpoint>], cursor: &AtomicUsize) -> Option<Arc<Endpoint>> {
    if candidates.is_empty() {
        return None;
    }

    let index = cursor.fetch_add(1, Ordering::Relaxed) % candidates.len();
    Some(candidates[index].clone())
}
