use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::DataError;
use crate::field::FieldKind;

/// A single value travelling between the model layer and the database.
///
/// Values are always bound as statement parameters and never spliced into
/// the SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    /// NULL written to a column of a known family. Drivers that type their
    /// parameters (Postgres) bind it with the matching type.
    TypedNull(FieldKind),
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null | SqlValue::TypedNull(_))
    }

    /// SQL-ish name of the variant, used in conversion errors and logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null | SqlValue::TypedNull(_) => "null",
            SqlValue::Bool(_) => "boolean",
            SqlValue::Int(_) => "bigint",
            SqlValue::Float(_) => "real",
            SqlValue::Text(_) => "text",
            SqlValue::Bytes(_) => "blob",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i),
            SqlValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Float(f) => Some(*f),
            SqlValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Null | SqlValue::TypedNull(_) => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{b}"),
            SqlValue::Int(i) => write!(f, "{i}"),
            SqlValue::Float(v) => write!(f, "{v}"),
            SqlValue::Text(s) => write!(f, "{s}"),
            SqlValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SqlValue::Null | SqlValue::TypedNull(_) => serializer.serialize_none(),
            SqlValue::Bool(b) => serializer.serialize_bool(*b),
            SqlValue::Int(i) => serializer.serialize_i64(*i),
            SqlValue::Float(f) => serializer.serialize_f64(*f),
            SqlValue::Text(s) => serializer.serialize_str(s),
            SqlValue::Bytes(b) => serializer.serialize_bytes(b),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::Int(i64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::Text(v.clone())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Conversion from a stored [`SqlValue`] into a Rust type.
///
/// `field` is only used to build the error message.
pub trait FromSqlValue: Sized {
    fn from_sql_value(value: SqlValue, field: &str) -> Result<Self, DataError>;
}

fn mismatch(field: &str, expected: &'static str) -> DataError {
    DataError::Conversion {
        field: field.to_string(),
        expected,
    }
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: SqlValue, _field: &str) -> Result<Self, DataError> {
        Ok(value)
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: SqlValue, field: &str) -> Result<Self, DataError> {
        match value {
            SqlValue::Text(s) => Ok(s),
            SqlValue::Bytes(b) => String::from_utf8(b).map_err(|_| mismatch(field, "String")),
            _ => Err(mismatch(field, "String")),
        }
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: SqlValue, field: &str) -> Result<Self, DataError> {
        value.as_i64().ok_or_else(|| mismatch(field, "i64"))
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(value: SqlValue, field: &str) -> Result<Self, DataError> {
        value.as_f64().ok_or_else(|| mismatch(field, "f64"))
    }
}

// SQLite and MySQL store booleans as integers.
impl FromSqlValue for bool {
    fn from_sql_value(value: SqlValue, field: &str) -> Result<Self, DataError> {
        match value {
            SqlValue::Bool(b) => Ok(b),
            SqlValue::Int(0) => Ok(false),
            SqlValue::Int(1) => Ok(true),
            _ => Err(mismatch(field, "bool")),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: SqlValue, field: &str) -> Result<Self, DataError> {
        match value {
            SqlValue::Bytes(b) => Ok(b),
            SqlValue::Text(s) => Ok(s.into_bytes()),
            _ => Err(mismatch(field, "Vec<u8>")),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: SqlValue, field: &str) -> Result<Self, DataError> {
        match value {
            v if v.is_null() => Ok(None),
            v => T::from_sql_value(v, field).map(Some),
        }
    }
}

/// One result row: ordered `(column, value)` pairs.
///
/// Column order follows the SELECT list. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        self.columns.push((column.into(), value));
    }

    /// Get a value by column name.
    ///
    /// Linear scan; rows are narrow.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    /// Get a value by column name and convert it.
    pub fn get_as<T: FromSqlValue>(&self, column: &str) -> Result<T, DataError> {
        let value = self.get(column).cloned().unwrap_or(SqlValue::Null);
        T::from_sql_value(value, column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for Row {
    type Item = (String, SqlValue);
    type IntoIter = std::vec::IntoIter<(String, SqlValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, SqlValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (k, v) in &self.columns {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
