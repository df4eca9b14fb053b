//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer (or an explicit one-shot cycle)
//!     → Probe every active endpoint concurrently
//!     → 200 → Healthy, anything else → Unhealthy
//!     → Update endpoint status, latency and counters
//! ```
//!
//! # Design Decisions
//! - Inactive endpoints are skipped, unhealthy ones are still probed
//! - Probe failures are absorbed into endpoint status, never propagated
//! - The loop only ends on cancellation

pub mod active;
