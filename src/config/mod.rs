//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FailoverConfig (validated, immutable)
//!     → to_runtime() conversions into component configs
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Components take plain structs, so nothing here is required to use them

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::FailoverConfig;
pub use schema::EndpointConfig;
pub use schema::{AdminConfig, CircuitBreakerSettings, LoadBalancerSettings, ObservabilityConfig, RetrySettings};
