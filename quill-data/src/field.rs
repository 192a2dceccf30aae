use std::sync::Arc;

use crate::value::SqlValue;

/// Default value of a mapped attribute.
///
/// Producers are evaluated lazily, the first time an unset attribute is
/// read through [`value_or_default`](crate::model::value_or_default).
#[derive(Clone)]
pub enum FieldDefault {
    Value(SqlValue),
    Producer(Arc<dyn Fn() -> SqlValue + Send + Sync>),
}

impl FieldDefault {
    pub fn resolve(&self) -> SqlValue {
        match self {
            FieldDefault::Value(v) => v.clone(),
            FieldDefault::Producer(f) => f(),
        }
    }
}

impl std::fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldDefault::Value(v) => write!(f, "Value({v:?})"),
            FieldDefault::Producer(_) => write!(f, "Producer(..)"),
        }
    }
}

/// Family of a field, which fixes its default SQL type and default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Boolean,
    Integer,
    Float,
    Text,
}

impl FieldKind {
    /// Booleans and free text never identify a row.
    pub fn can_be_primary_key(self) -> bool {
        matches!(self, FieldKind::String | FieldKind::Integer | FieldKind::Float)
    }
}

/// Describes one mapped attribute of an entity.
///
/// ```ignore
/// FieldDescriptor::string("id")
///     .primary_key()
///     .ddl("varchar(50)")
///     .default_with(|| next_id().into());
/// FieldDescriptor::float("created_at").column("create_at");
/// ```
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    attribute: String,
    column: Option<String>,
    kind: FieldKind,
    sql_type: String,
    primary_key: bool,
    default: Option<FieldDefault>,
}

impl FieldDescriptor {
    fn new(attribute: impl Into<String>, kind: FieldKind, sql_type: &str) -> Self {
        Self {
            attribute: attribute.into(),
            column: None,
            kind,
            sql_type: sql_type.to_string(),
            primary_key: false,
            default: None,
        }
    }

    /// `varchar(100)` unless overridden with [`ddl`](Self::ddl); no default.
    pub fn string(attribute: impl Into<String>) -> Self {
        Self::new(attribute, FieldKind::String, "varchar(100)")
    }

    /// `boolean`, defaults to `false`.
    pub fn boolean(attribute: impl Into<String>) -> Self {
        Self::new(attribute, FieldKind::Boolean, "boolean").default_value(false)
    }

    /// `bigint`, defaults to `0`.
    pub fn integer(attribute: impl Into<String>) -> Self {
        Self::new(attribute, FieldKind::Integer, "bigint").default_value(0i64)
    }

    /// `real`, defaults to `0.0`.
    pub fn float(attribute: impl Into<String>) -> Self {
        Self::new(attribute, FieldKind::Float, "real").default_value(0.0)
    }

    /// `text`; no default.
    pub fn text(attribute: impl Into<String>) -> Self {
        Self::new(attribute, FieldKind::Text, "text")
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Override the SQL column type.
    pub fn ddl(mut self, sql_type: impl Into<String>) -> Self {
        self.sql_type = sql_type.into();
        self
    }

    /// Map the attribute to a column with a different name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<SqlValue>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    pub fn default_with<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> SqlValue + Send + Sync + 'static,
    {
        self.default = Some(FieldDefault::Producer(Arc::new(producer)));
        self
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Column name in the table; the attribute name unless remapped.
    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.attribute)
    }

    pub fn is_renamed(&self) -> bool {
        self.column.as_deref().is_some_and(|c| c != self.attribute)
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn sql_type(&self) -> &str {
        &self.sql_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn default(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }
}

impl std::fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{:?}, {}:{}>", self.kind, self.sql_type, self.column_name())
    }
}
