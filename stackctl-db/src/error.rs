//! Classified database errors.
//!
//! The retry executor resolves transient lock contention itself; whatever
//! reaches a caller is either a classified failure carrying routing policy
//! or an unclassified driver error propagated unchanged.

use stackctl_core::ErrorPolicy;
use thiserror::Error;

/// Database access failures.
#[derive(Debug, Error)]
pub enum DbError {
    /// Lock wait timeout or deadlock; internal retries already exhausted.
    /// Callers must not retry again.
    #[error("database lock error: {message}")]
    Lock {
        /// MySQL server error code (1205 or 1213).
        code: u16,
        message: String,
    },

    /// Any other failure reported by the database server or transport.
    #[error("database error: {message}")]
    Database {
        /// MySQL server error code, when the server reported one.
        code: Option<u16>,
        message: String,
    },

    /// Failure outside database-driver classification, propagated unchanged.
    #[error(transparent)]
    Driver(#[from] sqlx::Error),

    /// Retry policy misconfiguration.
    #[error("invalid retry configuration: {0}")]
    Config(String),
}

impl DbError {
    /// Operational routing flags for classified failures.
    ///
    /// Unclassified driver passthroughs and misconfiguration carry no
    /// implied routing policy.
    pub fn policy(&self) -> Option<ErrorPolicy> {
        match self {
            Self::Lock { .. } => Some(ErrorPolicy::LOCK),
            Self::Database { .. } => Some(ErrorPolicy::DATABASE),
            Self::Driver(_) | Self::Config(_) => None,
        }
    }
}
