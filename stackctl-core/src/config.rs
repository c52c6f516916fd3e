//! Environment-sourced database configuration.
//!
//! The hosting platform injects connection settings as environment
//! variables; `.env` files are supported for local runs via [`load_env`].

use std::env;

use thiserror::Error;
use tracing::debug;

/// Connection character set. utf8mb4 so the full BMP+ range round-trips.
pub const CHARSET: &str = "utf8mb4";

/// Configuration errors for environment-sourced settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is absent.
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    /// A variable is present but unusable.
    #[error("invalid value for {var}: {reason}")]
    InvalidVar {
        var: &'static str,
        reason: String,
    },
}

/// Database connection settings read from the environment.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl DbConfig {
    /// Read `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: require("DB_HOST")?,
            port: require("DB_PORT")?
                .parse()
                .map_err(|e| ConfigError::InvalidVar {
                    var: "DB_PORT",
                    reason: format!("expected a port number: {e}"),
                })?,
            user: require("DB_USER")?,
            password: require("DB_PASSWORD")?,
            database: require("DB_NAME")?,
        })
    }
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    env::var(var).map_err(|_| ConfigError::MissingVar(var))
}

/// Best-effort `.env` loading for local runs.
///
/// Already-set environment variables win; a missing `.env` file is not an
/// error.
pub fn load_env() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("loaded .env from {}", path.display()),
        Err(_) => debug!("no .env file found, using environment variables only"),
    }
}
