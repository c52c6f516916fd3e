//! Retrying query executor.
//!
//! Classification is an explicit tagged outcome and the retry loop is an
//! explicit attempt-counter state machine, so retry boundaries are visible
//! and testable without a live server. Transient lock contention (MySQL
//! 1205 lock wait timeout, 1213 deadlock) retries with exponential backoff;
//! any other server or transport failure fails on the first attempt; errors
//! the driver did not classify propagate unchanged.

use futures::future::BoxFuture;
use sqlx::mysql::MySqlDatabaseError;
use tracing::{error, warn};

use crate::backoff::sleep_with_backoff;
use crate::error::DbError;

/// Total tries per unit of work: one initial attempt plus up to two retries.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// MySQL server error codes worth retrying internally.
const RETRYABLE_ERROR_CODES: [u16; 2] = [
    1205, // Lock wait timeout exceeded
    1213, // Deadlock found
];

/// Tagged outcome of inspecting a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryClass {
    /// Server-reported lock contention; eligible for internal retry.
    Transient(u16),
    /// Server or transport failure that retrying will not fix.
    Fatal(Option<u16>),
    /// Not a database-driver failure; propagate verbatim.
    Unclassified,
}

pub(crate) fn is_retryable_code(code: u16) -> bool {
    RETRYABLE_ERROR_CODES.contains(&code)
}

/// MySQL server error code, when the failure carries one.
fn mysql_error_code(err: &sqlx::Error) -> Option<u16> {
    err.as_database_error()
        .and_then(|db| db.try_downcast_ref::<MySqlDatabaseError>())
        .map(MySqlDatabaseError::number)
}

/// Classify a driver failure for the retry loop.
///
/// Transport failures (`Io`, `Tls`, `Protocol`) have no server code but
/// are still database-driver failures, so they classify as fatal rather
/// than passing through unclassified.
pub(crate) fn classify(err: &sqlx::Error) -> RetryClass {
    match err {
        sqlx::Error::Database(_) => match mysql_error_code(err) {
            Some(code) if is_retryable_code(code) => RetryClass::Transient(code),
            code => RetryClass::Fatal(code),
        },
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_) => {
            RetryClass::Fatal(None)
        }
        _ => RetryClass::Unclassified,
    }
}

/// Run a unit of work against `ctx`, retrying transient lock errors with
/// backoff.
///
/// The unit of work borrows the context per attempt and performs exactly
/// one query (or batch). Apart from that borrow, each attempt's future
/// must own its data (clone statements and bind values into the closure
/// rather than capturing caller references). On success its result returns
/// immediately; on exhausted transient retries the final failure surfaces
/// as [`DbError::Lock`]; other server failures surface as
/// [`DbError::Database`] with no retry.
pub async fn retry_query<C, T, F>(ctx: &mut C, op: F) -> Result<T, DbError>
where
    F: for<'c> FnMut(&'c mut C) -> BoxFuture<'c, Result<T, sqlx::Error>>,
{
    retry_query_with(ctx, DEFAULT_MAX_ATTEMPTS, classify, op).await
}

/// Retry loop with injectable attempt bound and classifier.
///
/// A zero attempt bound is a configuration error, reported immediately
/// rather than silently returning nothing.
pub(crate) async fn retry_query_with<C, T, F, X>(
    ctx: &mut C,
    max_attempts: u32,
    classify: X,
    mut op: F,
) -> Result<T, DbError>
where
    F: for<'c> FnMut(&'c mut C) -> BoxFuture<'c, Result<T, sqlx::Error>>,
    X: Fn(&sqlx::Error) -> RetryClass,
{
    if max_attempts == 0 {
        return Err(DbError::Config("max_attempts must be at least 1".into()));
    }
    let mut attempt = 0u32;
    loop {
        match op(ctx).await {
            Ok(value) => return Ok(value),
            Err(err) => match classify(&err) {
                RetryClass::Transient(code) => {
                    attempt += 1;
                    if attempt < max_attempts {
                        warn!(
                            code,
                            attempt,
                            max_retries = max_attempts - 1,
                            "retryable database error: {err}"
                        );
                        sleep_with_backoff(attempt).await;
                    } else {
                        error!(code, "max retries exceeded: {err}");
                        return Err(DbError::Lock {
                            code,
                            message: err.to_string(),
                        });
                    }
                }
                RetryClass::Fatal(code) => {
                    error!(code = ?code, "non-retryable database error: {err}");
                    return Err(DbError::Database {
                        code,
                        message: err.to_string(),
                    });
                }
                RetryClass::Unclassified => {
                    error!("unexpected error during query: {err}");
                    return Err(DbError::Driver(err));
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::FutureExt;

    use super::*;

    /// Code-less database error standing in for a server failure the
    /// classifier cannot downcast.
    #[derive(Debug)]
    struct StubDbError(&'static str);

    impl std::fmt::Display for StubDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl std::error::Error for StubDbError {}

    impl sqlx::error::DatabaseError for StubDbError {
        fn message(&self) -> &str {
            self.0
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    #[test]
    fn retryable_codes_are_lock_wait_and_deadlock() {
        assert!(is_retryable_code(1205));
        assert!(is_retryable_code(1213));
        assert!(!is_retryable_code(1046));
        assert!(!is_retryable_code(0));
    }

    #[test]
    fn non_driver_errors_are_unclassified() {
        assert_eq!(classify(&sqlx::Error::RowNotFound), RetryClass::Unclassified);
    }

    #[test]
    fn transport_errors_are_fatal_without_code() {
        let io = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset",
        ));
        assert_eq!(classify(&io), RetryClass::Fatal(None));
    }

    #[test]
    fn codeless_server_errors_are_fatal() {
        let err = sqlx::Error::Database(Box::new(StubDbError("server gone away")));
        assert_eq!(classify(&err), RetryClass::Fatal(None));
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_success_skips_backoff() {
        let started = tokio::time::Instant::now();
        let mut calls = 0u32;
        let result = retry_query_with(&mut calls, 3, classify, |calls| {
            async move {
                *calls += 1;
                Ok::<_, sqlx::Error>(42)
            }
            .boxed()
        })
        .await;
        assert_eq!(result.expect("should succeed"), 42);
        assert_eq!(calls, 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_retry_then_succeed() {
        let started = tokio::time::Instant::now();
        let mut calls = 0u32;
        let result = retry_query_with(
            &mut calls,
            3,
            |_| RetryClass::Transient(1213),
            |calls| {
                async move {
                    *calls += 1;
                    if *calls < 3 {
                        Err(sqlx::Error::Protocol("deadlock found".into()))
                    } else {
                        Ok(*calls)
                    }
                }
                .boxed()
            },
        )
        .await;
        assert_eq!(result.expect("third attempt should succeed"), 3);
        assert_eq!(calls, 3);
        // Two backoff waits: 0.1^1 + 0.1^2 seconds.
        assert!(started.elapsed() >= Duration::from_millis(110));
        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_transient_retries_raise_lock_error() {
        let started = tokio::time::Instant::now();
        let mut calls = 0u32;
        let result: Result<u32, _> = retry_query_with(
            &mut calls,
            3,
            |_| RetryClass::Transient(1205),
            |calls| {
                async move {
                    *calls += 1;
                    Err(sqlx::Error::Protocol("lock wait timeout exceeded".into()))
                }
                .boxed()
            },
        )
        .await;
        match result {
            Err(DbError::Lock { code, message }) => {
                assert_eq!(code, 1205);
                assert!(message.contains("lock wait timeout"));
            }
            other => panic!("expected lock error, got {other:?}"),
        }
        assert_eq!(calls, 3);
        assert!(started.elapsed() >= Duration::from_millis(110));
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_errors_fail_on_first_attempt() {
        let started = tokio::time::Instant::now();
        let mut calls = 0u32;
        let result: Result<u32, _> = retry_query_with(
            &mut calls,
            3,
            |_| RetryClass::Fatal(Some(1046)),
            |calls| {
                async move {
                    *calls += 1;
                    Err(sqlx::Error::Protocol("no database selected".into()))
                }
                .boxed()
            },
        )
        .await;
        match result {
            Err(DbError::Database { code, .. }) => assert_eq!(code, Some(1046)),
            other => panic!("expected database error, got {other:?}"),
        }
        assert_eq!(calls, 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    // The unit-of-work shape the executors use: statement text arrives as
    // a borrowed &str, is cloned into the closure, and each attempt's
    // future owns its copy alongside the context borrow.
    #[tokio::test(start_paused = true)]
    async fn unit_of_work_owns_statement_across_attempts() {
        let statement = String::from("SELECT 1");
        let sql: &str = statement.as_str();
        let sql = sql.to_owned();
        let mut calls = 0u32;
        let result = retry_query_with(
            &mut calls,
            3,
            |_| RetryClass::Transient(1213),
            move |calls| {
                let sql = sql.clone();
                async move {
                    *calls += 1;
                    if *calls < 2 {
                        Err(sqlx::Error::Protocol("deadlock found".into()))
                    } else {
                        Ok(sql.len())
                    }
                }
                .boxed()
            },
        )
        .await;
        assert_eq!(result.expect("second attempt should succeed"), 8);
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn unclassified_errors_propagate_unchanged() {
        let mut calls = 0u32;
        let result: Result<u32, _> = retry_query_with(&mut calls, 3, classify, |calls| {
            async move {
                *calls += 1;
                Err(sqlx::Error::RowNotFound)
            }
            .boxed()
        })
        .await;
        assert!(matches!(
            result,
            Err(DbError::Driver(sqlx::Error::RowNotFound))
        ));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn zero_max_attempts_is_a_configuration_error() {
        let mut calls = 0u32;
        let result = retry_query_with(&mut calls, 0, classify, |calls| {
            async move {
                *calls += 1;
                Ok::<_, sqlx::Error>(1)
            }
            .boxed()
        })
        .await;
        assert!(matches!(result, Err(DbError::Config(_))));
        assert_eq!(calls, 0);
    }
}
