//! stackctl-db: pooled MySQL access with classified-error retry logic
//!
//! # Design Principles
//!
//! - Explicitly constructed pool owner, shared by reference - no hidden
//!   process-global state
//! - Checked-out connections are RAII guards - release happens on every
//!   exit path
//! - Transient lock/deadlock errors (1205, 1213) retry internally with
//!   exponential backoff; everything else surfaces as a classified error
//! - Parameters are always bound, never interpolated into SQL text

pub mod backoff;
pub mod error;
pub mod exec;
pub mod pool;
pub mod repos;
pub mod retry;

pub use error::DbError;
pub use exec::{execute, execute_many, SqlParam};
pub use pool::{Database, PooledConn};
pub use repos::{row_to_map, RowMap, SiteLookup, SiteMasterRepo};
pub use retry::{retry_query, DEFAULT_MAX_ATTEMPTS};
