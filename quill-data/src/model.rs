//! Active-record models.
//!
//! An entity is a plain struct whose mapped attributes are `Option`s, so
//! "unset" is representable. [`Model`] exposes attribute access by name;
//! [`Orm`] bundles an [`Executor`] with the frozen [`Registry`] and
//! implements find/find_all/find_number/save/update/remove on top of the
//! prebuilt SQL templates. [`ActiveRecord`] puts the same operations on
//! the entity itself.

use std::future::Future;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::entity::{EntityMetadata, ModelDef};
use crate::error::DataError;
use crate::executor::Executor;
use crate::field::FieldDescriptor;
use crate::registry::Registry;
use crate::sql;
use crate::value::{Row, SqlValue};

/// A mapped entity type.
///
/// `get`/`set` are usually generated with [`model_fields!`](crate::model_fields).
pub trait Model: Default + Send + Sync + 'static {
    /// Table and field descriptors. Compiled once by
    /// [`RegistryBuilder::register`](crate::RegistryBuilder::register).
    fn definition() -> ModelDef;

    /// Current value of an attribute; `None` when unset or unknown.
    fn get(&self, attribute: &str) -> Option<SqlValue>;

    /// Assign an attribute. `SqlValue::Null` unsets it.
    fn set(&mut self, attribute: &str, value: SqlValue) -> Result<(), DataError>;

    /// Build a fresh instance from a result row keyed by attribute name.
    fn from_row(row: Row) -> Result<Self, DataError> {
        let mut entity = Self::default();
        for (attribute, value) in row {
            entity.set(&attribute, value)?;
        }
        Ok(entity)
    }
}

/// Error for `Model::set` on an attribute the entity does not map.
pub fn unknown_attribute<T>(attribute: &str) -> DataError {
    DataError::configuration(format!(
        "{} has no attribute '{attribute}'",
        std::any::type_name::<T>()
    ))
}

/// Implements [`Model::get`] and [`Model::set`] for `Option` attributes.
///
/// ```ignore
/// impl Model for User {
///     fn definition() -> ModelDef { ... }
///     quill_data::model_fields!(id, email, passwd, admin);
/// }
/// ```
#[macro_export]
macro_rules! model_fields {
    ( $( $attr:ident ),* $(,)? ) => {
        fn get(&self, attribute: &str) -> Option<$crate::SqlValue> {
            match attribute {
                $( stringify!($attr) => self.$attr.clone().map($crate::SqlValue::from), )*
                _ => None,
            }
        }

        fn set(
            &mut self,
            attribute: &str,
            value: $crate::SqlValue,
        ) -> Result<(), $crate::DataError> {
            match attribute {
                $(
                    stringify!($attr) => {
                        self.$attr = $crate::FromSqlValue::from_sql_value(value, attribute)?;
                    }
                )*
                other => return Err($crate::model::unknown_attribute::<Self>(other)),
            }
            Ok(())
        }
    };
}

/// Read an attribute, falling back to its descriptor default.
///
/// A resolved default is written back onto the instance, so producers
/// (ids, timestamps) run at most once per instance.
pub fn value_or_default<T: Model>(
    entity: &mut T,
    field: &FieldDescriptor,
) -> Result<SqlValue, DataError> {
    if let Some(value) = entity.get(field.attribute()).filter(|v| !v.is_null()) {
        return Ok(value);
    }
    match field.default() {
        Some(default) => {
            let value = default.resolve();
            debug!(attribute = field.attribute(), value = %value, "using default value");
            entity.set(field.attribute(), value.clone())?;
            Ok(value)
        }
        None => Ok(SqlValue::TypedNull(field.kind())),
    }
}

/// Row cap for [`FindAll`]: a count, or an offset/count window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Count(u64),
    Range { offset: u64, count: u64 },
}

impl Limit {
    /// Build a limit from one value (count) or two (offset, count).
    ///
    /// Any other shape, or a negative value, is a validation error on `limit`.
    pub fn from_values(values: &[i64]) -> Result<Self, DataError> {
        let non_negative = |v: i64| {
            u64::try_from(v)
                .map_err(|_| DataError::validation("limit", format!("negative limit value: {v}")))
        };
        match values {
            [count] => Ok(Limit::Count(non_negative(*count)?)),
            [offset, count] => Ok(Limit::Range {
                offset: non_negative(*offset)?,
                count: non_negative(*count)?,
            }),
            other => Err(DataError::validation(
                "limit",
                format!("invalid limit value: {other:?}"),
            )),
        }
    }
}

impl From<u64> for Limit {
    fn from(count: u64) -> Self {
        Limit::Count(count)
    }
}

impl From<(u64, u64)> for Limit {
    fn from((offset, count): (u64, u64)) -> Self {
        Limit::Range { offset, count }
    }
}

impl TryFrom<&serde_json::Value> for Limit {
    type Error = DataError;

    /// Accepts `10` or `[20, 10]`.
    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        let invalid = || DataError::validation("limit", format!("invalid limit value: {value}"));
        match value {
            serde_json::Value::Number(n) => Limit::from_values(&[n.as_i64().ok_or_else(invalid)?]),
            serde_json::Value::Array(items) => {
                let values = items
                    .iter()
                    .map(|v| v.as_i64().ok_or_else(invalid))
                    .collect::<Result<Vec<_>, _>>()?;
                Limit::from_values(&values)
            }
            _ => Err(invalid()),
        }
    }
}

/// Query options for `find_all`.
///
/// ```ignore
/// FindAll::new()
///     .filter("`user_id`=?", ["0014..."])
///     .order_by("`created_at` desc")
///     .limit((0, 10))
/// ```
#[derive(Debug, Clone, Default)]
pub struct FindAll {
    where_clause: Option<String>,
    args: Vec<SqlValue>,
    order_by: Option<String>,
    limit: Option<Limit>,
}

impl FindAll {
    pub fn new() -> Self {
        Self::default()
    }

    /// SQL condition with `?` placeholders, and its arguments.
    pub fn filter<I, V>(mut self, clause: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.where_clause = Some(clause.into());
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.order_by = Some(order.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = Some(limit.into());
        self
    }
}

/// Model operations over an executor and a frozen registry.
///
/// The ORM never caches instances: every find builds fresh values.
pub struct Orm<E> {
    executor: E,
    registry: Arc<Registry>,
}

impl<E: Clone> Clone for Orm<E> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<E: Executor> Orm<E> {
    pub fn new(executor: E, registry: Arc<Registry>) -> Self {
        Self { executor, registry }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn metadata<T: Model>(&self) -> Result<&EntityMetadata, DataError> {
        self.registry.get::<T>()
    }

    /// Find one entity by primary key.
    pub async fn find<T: Model>(&self, pk: impl Into<SqlValue>) -> Result<Option<T>, DataError> {
        let meta = self.metadata::<T>()?;
        let sql = sql::find_by_pk(meta);
        let args = [pk.into()];
        let rows = self.executor.query(&sql, &args, Some(1)).await?;
        rows.into_iter().next().map(T::from_row).transpose()
    }

    /// Find entities matching the query options.
    pub async fn find_all<T: Model>(&self, query: FindAll) -> Result<Vec<T>, DataError> {
        let meta = self.metadata::<T>()?;
        let FindAll {
            where_clause,
            mut args,
            order_by,
            limit,
        } = query;
        let sql = sql::find_all(
            meta,
            where_clause.as_deref(),
            order_by.as_deref(),
            limit,
            &mut args,
        );
        let rows = self.executor.query(&sql, &args, None).await?;
        rows.into_iter().map(T::from_row).collect()
    }

    /// Evaluate an aggregate such as `count(id)` over the entity's table.
    ///
    /// Returns `None` when the query yields no row or a NULL scalar.
    pub async fn find_number<T: Model>(
        &self,
        expr: &str,
        where_clause: Option<&str>,
        args: &[SqlValue],
    ) -> Result<Option<SqlValue>, DataError> {
        let meta = self.metadata::<T>()?;
        let sql = sql::find_number(meta, expr, where_clause);
        let rows = self.executor.query(&sql, args, Some(1)).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("_num_"))
            .filter(|v| !v.is_null())
            .cloned())
    }

    /// INSERT the entity, resolving defaults (primary key included) first.
    ///
    /// Returns the affected row count. A count other than 1 is logged as a
    /// warning and not treated as an error.
    pub async fn save<T: Model>(&self, entity: &mut T) -> Result<u64, DataError> {
        let meta = self.metadata::<T>()?;
        let mut args = Vec::with_capacity(meta.fields().len() + 1);
        for field in meta.fields() {
            args.push(value_or_default(entity, field)?);
        }
        args.push(value_or_default(entity, meta.primary_key())?);
        let rows = self
            .executor
            .execute(meta.insert_sql(), &args, self.executor.autocommit())
            .await?;
        if rows != 1 {
            warn!(table = meta.table(), rows, "failed to insert record: affected rows != 1");
        }
        Ok(rows)
    }

    /// UPDATE every non-key field from the in-memory values, keyed on the primary key.
    pub async fn update<T: Model>(&self, entity: &T) -> Result<u64, DataError> {
        let meta = self.metadata::<T>()?;
        let mut args: Vec<SqlValue> = meta
            .fields()
            .iter()
            .map(|f| {
                entity
                    .get(f.attribute())
                    .filter(|v| !v.is_null())
                    .unwrap_or(SqlValue::TypedNull(f.kind()))
            })
            .collect();
        args.push(primary_key_value(entity, meta)?);
        let rows = self
            .executor
            .execute(meta.update_sql(), &args, self.executor.autocommit())
            .await?;
        if rows != 1 {
            warn!(table = meta.table(), rows, "failed to update by primary key: affected rows != 1");
        }
        Ok(rows)
    }

    /// DELETE by primary key. The instance is consumed.
    pub async fn remove<T: Model>(&self, entity: T) -> Result<u64, DataError> {
        let meta = self.metadata::<T>()?;
        let args = [primary_key_value(&entity, meta)?];
        let rows = self
            .executor
            .execute(meta.delete_sql(), &args, self.executor.autocommit())
            .await?;
        if rows != 1 {
            warn!(table = meta.table(), rows, "failed to remove by primary key: affected rows != 1");
        }
        Ok(rows)
    }

    /// Create the table for `T` if it does not exist.
    pub async fn create_table<T: Model>(&self) -> Result<(), DataError> {
        let meta = self.metadata::<T>()?;
        self.executor
            .execute(&sql::create_table(meta, self.executor.dialect()), &[], true)
            .await?;
        Ok(())
    }
}

fn primary_key_value<T: Model>(entity: &T, meta: &EntityMetadata) -> Result<SqlValue, DataError> {
    let pk = meta.primary_key().attribute();
    entity
        .get(pk)
        .filter(|v| !v.is_null())
        .ok_or_else(|| DataError::validation(pk, "primary key is not set"))
}

/// Active-record style access: the operations of [`Orm`] called on the entity.
///
/// ```ignore
/// let mut user = User { email: Some("a@b.com".into()), ..Default::default() };
/// user.save(&orm).await?;
/// let again = User::find(&orm, user.id.clone()).await?;
/// ```
pub trait ActiveRecord: Model {
    fn find<E: Executor>(
        orm: &Orm<E>,
        pk: impl Into<SqlValue> + Send,
    ) -> impl Future<Output = Result<Option<Self>, DataError>> + Send {
        orm.find::<Self>(pk)
    }

    fn find_all<E: Executor>(
        orm: &Orm<E>,
        query: FindAll,
    ) -> impl Future<Output = Result<Vec<Self>, DataError>> + Send {
        orm.find_all::<Self>(query)
    }

    fn find_number<'a, E: Executor>(
        orm: &'a Orm<E>,
        expr: &'a str,
        where_clause: Option<&'a str>,
        args: &'a [SqlValue],
    ) -> impl Future<Output = Result<Option<SqlValue>, DataError>> + Send + 'a {
        orm.find_number::<Self>(expr, where_clause, args)
    }

    fn save<'a, E: Executor>(
        &'a mut self,
        orm: &'a Orm<E>,
    ) -> impl Future<Output = Result<u64, DataError>> + Send + 'a {
        orm.save(self)
    }

    fn update<'a, E: Executor>(
        &'a self,
        orm: &'a Orm<E>,
    ) -> impl Future<Output = Result<u64, DataError>> + Send + 'a {
        orm.update(self)
    }

    fn remove<E: Executor>(self, orm: &Orm<E>) -> impl Future<Output = Result<u64, DataError>> + Send {
        orm.remove(self)
    }
}

impl<T: Model> ActiveRecord for T {}

/// Time-ordered 50-character id: 15-digit millisecond timestamp, 32 hex
/// digits of a random UUID, and a `000` suffix.
pub fn next_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{millis:015}{}000", uuid::Uuid::new_v4().simple())
}

/// Seconds since the Unix epoch as a float, the timestamp format of the
/// `created_at` columns.
pub fn timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
