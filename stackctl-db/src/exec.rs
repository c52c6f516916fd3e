//! Parameterized SQL execution through the retrying executor.

use futures::FutureExt;
use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::Query;
use sqlx::MySqlConnection;

use crate::error::DbError;
use crate::retry::retry_query;

/// Owned bind values.
///
/// Values are always bound, never interpolated into SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

fn bind_param<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    param: &'q SqlParam,
) -> Query<'q, MySql, MySqlArguments> {
    match param {
        SqlParam::Text(value) => query.bind(value.as_str()),
        SqlParam::Int(value) => query.bind(*value),
        SqlParam::Float(value) => query.bind(*value),
        SqlParam::Bool(value) => query.bind(*value),
        SqlParam::Null => query.bind(None::<String>),
    }
}

/// Execute one statement with bound parameters, retrying transient lock
/// errors, and return the affected-row count.
///
/// Each attempt's future owns its statement and parameters, so the unit of
/// work is valid for whatever lifetime the retry loop hands it.
pub async fn execute(
    conn: &mut MySqlConnection,
    sql: &str,
    params: &[SqlParam],
) -> Result<u64, DbError> {
    let sql = sql.to_owned();
    let params = params.to_vec();
    retry_query(conn, move |conn| {
        let sql = sql.clone();
        let params = params.clone();
        async move {
            let mut query = sqlx::query(&sql);
            for param in &params {
                query = bind_param(query, param);
            }
            query.execute(&mut *conn).await.map(|done| done.rows_affected())
        }
        .boxed()
    })
    .await
}

/// Execute the statement once per parameter set as a single retryable unit
/// of work; returns the summed affected-row count.
pub async fn execute_many(
    conn: &mut MySqlConnection,
    sql: &str,
    param_sets: &[Vec<SqlParam>],
) -> Result<u64, DbError> {
    let sql = sql.to_owned();
    let param_sets = param_sets.to_vec();
    retry_query(conn, move |conn| {
        let sql = sql.clone();
        let param_sets = param_sets.clone();
        async move {
            let mut affected = 0u64;
            for params in &param_sets {
                let mut query = sqlx::query(&sql);
                for param in params {
                    query = bind_param(query, param);
                }
                affected += query.execute(&mut *conn).await?.rows_affected();
            }
            Ok(affected)
        }
        .boxed()
    })
    .await
}
