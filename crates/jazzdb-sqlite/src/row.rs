//! Conversion between `SqlValue` and sqlx SQLite arguments and rows.

use jazzdb_core::connection::ConnectionResult;
use jazzdb_core::{ConnectionError, SqlValue};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Decode, Row, Sqlite, TypeInfo, ValueRef};

/// Binds a SqlValue parameter to a raw query.
pub(crate) fn bind_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

/// Column names of a row.
pub(crate) fn column_names(row: &SqliteRow) -> Vec<String> {
    row.columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect()
}

/// Decodes every value of a row by its storage class.
pub(crate) fn decode_row(row: &SqliteRow) -> ConnectionResult<Vec<SqlValue>> {
    (0..row.len()).map(|index| decode_value(row, index)).collect()
}

fn decode_value(row: &SqliteRow, index: usize) -> ConnectionResult<SqlValue> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| ConnectionError::with_source(e.to_string(), e))?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }

    let storage = raw.type_info().name().to_string();
    let decoded = match storage.as_str() {
        "INTEGER" | "BOOLEAN" => <i64 as Decode<Sqlite>>::decode(raw).map(SqlValue::Int),
        "REAL" => <f64 as Decode<Sqlite>>::decode(raw).map(SqlValue::Float),
        "BLOB" => <Vec<u8> as Decode<Sqlite>>::decode(raw).map(SqlValue::Blob),
        _ => <String as Decode<Sqlite>>::decode(raw).map(SqlValue::Text),
    };
    decoded.map_err(|e| {
        ConnectionError::new(format!("failed to decode column {index} ({storage}): {e}"))
    })
}
