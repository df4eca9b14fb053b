//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build orchestrator → start() → Serve status API
//!
//! Shutdown (signals.rs):
//!     SIGTERM/SIGINT → Stop status API → orchestrator.stop() → Exit
//! ```

pub mod signals;
