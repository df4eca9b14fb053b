//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to an endpoint:
//!     → circuit_breaker.rs (admit or fail fast)
//!     → timeouts.rs (enforce the per-call deadline)
//!     → circuit_breaker.rs (record outcome, maybe transition)
//!     → On failure: backoff.rs (delay before the orchestrator retries)
//! ```
//!
//! # Design Decisions
//! - Every wrapped call has a deadline; overrun counts as failure
//! - Jittered backoff prevents synchronized retry storms
//! - Circuit breaker state has its own lock, shared with nothing else

pub mod backoff;
pub mod circuit_breaker;
pub mod timeouts;
