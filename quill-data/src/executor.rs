use std::future::Future;

use crate::dialect::Dialect;
use crate::error::DataError;
use crate::value::{Row, SqlValue};

/// Statement execution backend used by the model layer.
///
/// SQL handed to an executor is canonical (`?` placeholders, backtick
/// quoting); the executor rewrites it for its driver.
///
/// Uses RPITIT (return-position `impl Trait` in traits), no `async-trait`.
pub trait Executor: Send + Sync {
    /// Run a read statement, returning at most `limit` rows (all if `None`).
    fn query(
        &self,
        sql: &str,
        args: &[SqlValue],
        limit: Option<usize>,
    ) -> impl Future<Output = Result<Vec<Row>, DataError>> + Send;

    /// Run a write statement and return the affected row count.
    ///
    /// With `autocommit == false` the statement runs inside an explicit
    /// transaction that is rolled back before the error is returned.
    fn execute(
        &self,
        sql: &str,
        args: &[SqlValue],
        autocommit: bool,
    ) -> impl Future<Output = Result<u64, DataError>> + Send;

    /// Autocommit mode used by model writes.
    fn autocommit(&self) -> bool {
        true
    }

    /// Dialect the executor rewrites statements for. DDL column types are
    /// adjusted to it.
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }
}
