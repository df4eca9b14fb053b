//! Least-loaded load balancing strategy.

use std::sync::Arc;
use crate::load_balancer::endpoint::Endpoint;

/// Pick the candidate with the fewest recorded outcomes
/// (`success_count + error_count`). Ties go to the earliest in list order.
pub fn select(candidates: &[Arc<Endpoint>]) -> Option<Arc<Endpoint>> {
    // min_by_key keeps the first of equal minimums
    candidates.iter().min_by_key(|e| e.load()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use url::Url;

    fn ep(name: &str) -> Arc<Endpoint> {
        Arc::new(Endpoint::new(name, Url::parse("http://127.0.0.1").unwrap(), 8080, "/health"))
    }

    #[test]
    fn test_least_loaded() {
        let a = ep("a");
        let b = ep("b");
        let c = ep("c");
        a.mark_success(Duration::from_millis(1));
        a.mark_failure(None);
        b.mark_success(Duration::from_millis(1));
        c.mark_success(Duration::from_millis(1));

        let endpoints = vec![a.clone(), b.clone(), c.clone()];
        assert_eq!(select(&endpoints).unwrap().name(), "b");

        b.mark_success(Duration::from_millis(1));
        assert_eq!(select(&endpoints).unwrap().name(), "c");
    }

    #[test]
    fn test_tie_goes_to_first() {
        let endpoints = vec![ep("x"), ep("y")];
        assert_eq!(select(&endpoints).unwrap().name(), "x");
    }
}
