//! Conversions between `quill_data` values and `sqlx::any` rows.

use quill_data::{DataError, FieldKind, Row, SqlValue};
use sqlx::any::{AnyArguments, AnyRow, AnyTypeInfoKind};
use sqlx::query::Query;
use sqlx::{Any, Column as _, Row as _, ValueRef as _};

use crate::error::SqlxErrorExt;

pub(crate) type AnyQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

/// Bind every argument in order. Values are never spliced into the SQL.
pub(crate) fn bind_args<'q>(mut query: AnyQuery<'q>, args: &[SqlValue]) -> AnyQuery<'q> {
    for arg in args {
        query = match arg {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::TypedNull(kind) => match kind {
                FieldKind::Boolean => query.bind(None::<bool>),
                FieldKind::Integer => query.bind(None::<i64>),
                FieldKind::Float => query.bind(None::<f64>),
                FieldKind::String | FieldKind::Text => query.bind(None::<String>),
            },
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Bytes(b) => query.bind(b.clone()),
        };
    }
    query
}

/// Decode a driver row into ordered `(column, value)` pairs.
///
/// Each value is decoded by its runtime kind, so a column declared one way
/// but holding another storage class (SQLite) still reads back.
pub(crate) fn decode_row(row: &AnyRow) -> Result<Row, DataError> {
    let mut out = Row::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let raw = row
            .try_get_raw(index)
            .map_err(SqlxErrorExt::into_data_error)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            let kind = raw.type_info().kind();
            decode_value(row, index, name, kind)?
        };
        out.push(name, value);
    }
    Ok(out)
}

fn decode_value(
    row: &AnyRow,
    index: usize,
    name: &str,
    kind: AnyTypeInfoKind,
) -> Result<SqlValue, DataError> {
    let decoded = match kind {
        AnyTypeInfoKind::Bool => row.try_get::<bool, _>(index).ok().map(SqlValue::Bool),
        AnyTypeInfoKind::SmallInt | AnyTypeInfoKind::Integer | AnyTypeInfoKind::BigInt => row
            .try_get::<i64, _>(index)
            .ok()
            .or_else(|| row.try_get::<i32, _>(index).ok().map(i64::from))
            .or_else(|| row.try_get::<i16, _>(index).ok().map(i64::from))
            .map(SqlValue::Int),
        AnyTypeInfoKind::Real | AnyTypeInfoKind::Double => row
            .try_get::<f64, _>(index)
            .ok()
            .or_else(|| row.try_get::<f32, _>(index).ok().map(f64::from))
            .map(SqlValue::Float),
        AnyTypeInfoKind::Text => row.try_get::<String, _>(index).ok().map(SqlValue::Text),
        AnyTypeInfoKind::Blob => row.try_get::<Vec<u8>, _>(index).ok().map(SqlValue::Bytes),
        _ => None,
    };
    match decoded {
        Some(value) => Ok(value),
        None => decode_any(row, index, name),
    }
}

/// Try each supported Rust type in turn.
fn decode_any(row: &AnyRow, index: usize, name: &str) -> Result<SqlValue, DataError> {
    if let Ok(i) = row.try_get::<i64, _>(index) {
        return Ok(SqlValue::Int(i));
    }
    if let Ok(f) = row.try_get::<f64, _>(index) {
        return Ok(SqlValue::Float(f));
    }
    if let Ok(b) = row.try_get::<bool, _>(index) {
        return Ok(SqlValue::Bool(b));
    }
    if let Ok(s) = row.try_get::<String, _>(index) {
        return Ok(SqlValue::Text(s));
    }
    if let Ok(b) = row.try_get::<Vec<u8>, _>(index) {
        return Ok(SqlValue::Bytes(b));
    }
    Err(DataError::Conversion {
        field: name.to_string(),
        expected: "integer, real, boolean, text or blob",
    })
}
