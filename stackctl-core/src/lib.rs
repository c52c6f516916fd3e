//! stackctl-core: shared types for the stackctl control handler
//!
//! Provides the operational error-routing taxonomy (retry / alert /
//! dead-letter / audit flags carried as plain data) and environment-sourced
//! database configuration.

pub mod config;
pub mod error;

pub use config::{load_env, ConfigError, DbConfig};
pub use error::ErrorPolicy;
