//! Repositories over the pooled database.

mod site_master;

use std::collections::BTreeMap;

use serde_json::Value;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row};
use tracing::warn;

pub use site_master::{SiteLookup, SiteMasterRepo};

/// A fetched row as a column-name-keyed mapping.
pub type RowMap = BTreeMap<String, Value>;

/// Decode every column of a row into a [`RowMap`].
pub fn row_to_map(row: &MySqlRow) -> RowMap {
    let mut map = RowMap::new();
    for (index, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), decode_column(row, index));
    }
    map
}

/// Decode a single column by probing the common MySQL type families.
/// Anything else becomes null with a warning rather than failing the row.
fn decode_column(row: &MySqlRow, index: usize) -> Value {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<u64>, _>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value.map(Value::from).unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index) {
        return value
            .map(|ts| Value::String(ts.to_rfc3339()))
            .unwrap_or(Value::Null);
    }
    if let Ok(value) = row.try_get::<Option<chrono::NaiveDateTime>, _>(index) {
        return value
            .map(|ts| Value::String(ts.to_string()))
            .unwrap_or(Value::Null);
    }
    warn!(
        column = row.columns()[index].name(),
        "unsupported column type, returning null"
    );
    Value::Null
}
