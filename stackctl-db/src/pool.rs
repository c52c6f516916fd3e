//! Connection pool management and the pooled-connection guard.
//!
//! The pool owner is constructed explicitly and shared by reference -
//! there is no hidden process-global. First use initializes the pool
//! behind a mutex so concurrent callers observe exactly one pool.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::MySqlConnection;
use stackctl_core::config::CHARSET;
use stackctl_core::DbConfig;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::DbError;

/// Hard cap on live connections.
const MAX_CONNECTIONS: u32 = 20;
/// Idle connections kept warm for reuse.
const MIN_CONNECTIONS: u32 = 5;
/// Acquire waits are effectively unbounded; the hosting runtime's
/// invocation deadline is the only real bound. sqlx requires a finite
/// timeout, so use one no invocation will outlive.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Owner of the MySQL connection pool.
///
/// Construct once, share by reference (or `Arc`). The pool itself is built
/// on [`initialize`](Self::initialize) or on first
/// [`acquire`](Self::acquire).
pub struct Database {
    config: DbConfig,
    pool: Mutex<Option<MySqlPool>>,
    init_count: AtomicU32,
}

impl Database {
    pub fn new(config: DbConfig) -> Self {
        Self {
            config,
            pool: Mutex::new(None),
            init_count: AtomicU32::new(0),
        }
    }

    /// Build a fresh pool, replacing (and closing) any existing one.
    pub async fn initialize(&self) {
        let pool = build_pool(&self.config);
        self.init_count.fetch_add(1, Ordering::Relaxed);
        let previous = self.pool.lock().await.replace(pool);
        if let Some(previous) = previous {
            warn!("replacing existing connection pool");
            previous.close().await;
        }
    }

    /// Check out one connection, initializing the pool on first use.
    ///
    /// Waits (rather than failing) when the pool is saturated; callers
    /// needing a bounded wait must impose their own timeout.
    pub async fn acquire(&self) -> Result<PooledConn, DbError> {
        let pool = self.pool().await;
        let conn = pool.acquire().await?;
        Ok(PooledConn { inner: conn })
    }

    /// Close every pooled connection. A later acquire re-initializes.
    pub async fn close_all(&self) {
        if let Some(pool) = self.pool.lock().await.take() {
            pool.close().await;
            info!("closed all pooled connections");
        }
    }

    /// Pool handle, lazily initialized.
    ///
    /// The mutex is the single initialization barrier: concurrent first
    /// users get exactly one pool.
    async fn pool(&self) -> MySqlPool {
        let mut slot = self.pool.lock().await;
        if let Some(pool) = slot.as_ref() {
            return pool.clone();
        }
        info!("initializing connection pool on first use");
        let pool = build_pool(&self.config);
        self.init_count.fetch_add(1, Ordering::Relaxed);
        *slot = Some(pool.clone());
        pool
    }

    #[cfg(test)]
    fn initializations(&self) -> u32 {
        self.init_count.load(Ordering::Relaxed)
    }
}

/// Pool construction is lazy: no connection is established until first
/// checkout, and sqlx keeps `MIN_CONNECTIONS` warm in the background.
fn build_pool(config: &DbConfig) -> MySqlPool {
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database)
        .charset(CHARSET);
    MySqlPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .min_connections(MIN_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .test_before_acquire(false)
        .connect_lazy_with(options)
}

/// Scoped guard over a checked-out connection.
///
/// The connection returns to the pool exactly once, when the guard drops -
/// on normal return, error, or unwind alike.
pub struct PooledConn {
    inner: PoolConnection<MySql>,
}

impl Deref for PooledConn {
    type Target = MySqlConnection;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PooledConn {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl Drop for PooledConn {
    fn drop(&mut self) {
        // The inner handle's drop glue performs the actual release.
        debug!("returning connection to pool");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn test_config() -> DbConfig {
        DbConfig {
            host: "127.0.0.1".into(),
            port: 3306,
            user: "app".into(),
            password: "secret".into(),
            database: "saas".into(),
        }
    }

    // Pool construction is lazy, so these run without a server.

    #[tokio::test]
    async fn concurrent_first_use_creates_one_pool() {
        let db = Arc::new(Database::new(test_config()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = Arc::clone(&db);
                tokio::spawn(async move {
                    db.pool().await;
                })
            })
            .collect();
        for handle in handles {
            handle.await.expect("task panicked");
        }
        assert_eq!(db.initializations(), 1);
    }

    #[tokio::test]
    async fn close_all_allows_reinitialization() {
        let db = Database::new(test_config());
        db.pool().await;
        db.close_all().await;
        db.pool().await;
        assert_eq!(db.initializations(), 2);
    }

    #[tokio::test]
    async fn initialize_replaces_existing_pool() {
        let db = Database::new(test_config());
        db.initialize().await;
        db.initialize().await;
        assert_eq!(db.initializations(), 2);
    }
}
