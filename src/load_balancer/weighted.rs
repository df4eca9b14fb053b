//! Weighted-random load balancing strategy.

use std::sync::Arc;
use rand::Rng;
use crate::load_balancer::endpoint::Endpoint;

/// Pick a candidate with probability proportional to its weight.
///
/// When every weight is zero the first candidate is returned.
pub fn select(candidates: &[Arc<Endpoint>]) -> Option<Arc<Endpoint>> {
    select_with(candidates, |total| rand::thread_rng().gen_range(0..total))
}

/// Same as [`select`] with the uniform draw in `[0, total)` supplied by `draw`.
pub fn select_with<D>(candidates: &[Arc<Endpoint>], draw: D) -> Option<Arc<Endpoint>>
where
    D: FnOnce(u64) -> u64,
{
    let first = candidates.first()?;

    let total: u64 = candidates.iter().map(|e| u64::from(e.weight())).sum();
    if total == 0 {
        return Some(first.clone());
    }

    let target = draw(total);
    let mut cumulative = 0u64;
    for endpoint in candidates {
        cumulative += u64::from(endpoint.weight());
        if target < cumulative {
            return Some(endpoint.clone());
        }
    }

    candidates.last().cloned()
}
