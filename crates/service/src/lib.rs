//! Shared service infrastructure for the basket storage gateway.
//!
//! This crate provides the pieces the gateway binary wires together:
//! - Configuration (TOML file plus overrides)
//! - State management (ServiceState holding the bucket resolver and object store)
//! - HTTP handlers (object dispatch, archive browsing, health checks)

pub mod config;
pub mod http;
pub mod state;
pub mod version;

// Re-export key types for convenience
pub use config::{Config, ConfigError};
pub use state::{State as ServiceState, StateSetupError};
