//! The connection pool and its statement execution.

use std::future::Future;

use futures_util::future::BoxFuture;
use futures_util::TryStreamExt;
use quill_data::{DataError, Dialect, Executor, Row, SqlValue};
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyConnection, AnyPool};
use sqlx::pool::PoolConnection;
use sqlx::Any;
use tracing::{debug, info, warn};

use crate::config::PoolConfig;
use crate::error::SqlxErrorExt;
use crate::row::{bind_args, decode_row};

/// Pooled connections to one database.
///
/// Cloning is cheap; clones share the same connections.
///
/// ```ignore
/// let pool = Pool::initialize(PoolConfig::from_config(&config)?).await?;
/// let orm = Orm::new(pool.clone(), registry);
/// ```
#[derive(Clone)]
pub struct Pool {
    inner: AnyPool,
    dialect: Dialect,
    autocommit: bool,
}

impl Pool {
    /// Validate `config`, open `min_size` connections and return the pool.
    ///
    /// Waiting for a connection on an exhausted pool is bounded by
    /// `acquire_timeout`.
    pub async fn initialize(config: PoolConfig) -> Result<Self, DataError> {
        config.validate()?;
        sqlx::any::install_default_drivers();
        info!(
            driver = %config.driver,
            host = %config.host,
            port = config.port,
            min_size = config.min_size,
            max_size = config.max_size,
            "create database connection pool"
        );

        let inner = AnyPoolOptions::new()
            .min_connections(config.min_size)
            .max_connections(config.max_size)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url())
            .await
            .map_err(SqlxErrorExt::into_data_error)?;

        let pool = Self {
            inner,
            dialect: config.driver.dialect(),
            autocommit: config.autocommit,
        };
        pool.warm_up(config.min_size).await?;
        Ok(pool)
    }

    async fn warm_up(&self, min_size: u32) -> Result<(), DataError> {
        let mut held: Vec<PoolConnection<Any>> = Vec::with_capacity(min_size as usize);
        for _ in 0..min_size {
            held.push(self.acquire().await?);
        }
        debug!(connections = held.len(), "pool warmed up");
        Ok(())
    }

    async fn acquire(&self) -> Result<PoolConnection<Any>, DataError> {
        self.inner
            .acquire()
            .await
            .map_err(SqlxErrorExt::into_data_error)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Open plus idle connections.
    pub fn size(&self) -> u32 {
        self.inner.size()
    }

    pub fn num_idle(&self) -> usize {
        self.inner.num_idle()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Borrow one connection for the duration of `f`.
    ///
    /// The connection goes back to the pool when `f` completes, fails, or
    /// is dropped.
    ///
    /// ```ignore
    /// let rows = pool
    ///     .with_connection(|mut conn| Box::pin(async move {
    ///         conn.execute("DELETE FROM `comments` WHERE `blog_id`=?", &["b1".into()]).await?;
    ///         conn.query("SELECT count(*) AS `n` FROM `comments`", &[], None).await
    ///     }))
    ///     .await?;
    /// ```
    pub async fn with_connection<F, T>(&self, f: F) -> Result<T, DataError>
    where
        F: for<'c> FnOnce(Connection<'c>) -> BoxFuture<'c, Result<T, DataError>>,
    {
        let mut conn = self.acquire().await?;
        f(Connection::new(&mut *conn, self.dialect)).await
    }

    /// Run `f` inside one transaction on one connection.
    ///
    /// Commits when `f` succeeds; otherwise rolls back before the error is
    /// returned.
    pub async fn transaction<F, T>(&self, f: F) -> Result<T, DataError>
    where
        F: for<'c> FnOnce(Connection<'c>) -> BoxFuture<'c, Result<T, DataError>>,
    {
        let mut tx = self
            .inner
            .begin()
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        match f(Connection::new(&mut *tx, self.dialect)).await {
            Ok(value) => {
                tx.commit().await.map_err(SqlxErrorExt::into_data_error)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Run a write statement and return the affected row count.
    ///
    /// With `autocommit == false` the statement runs in its own
    /// transaction, which is rolled back before a failure is returned.
    pub async fn execute(
        &self,
        sql: &str,
        args: &[SqlValue],
        autocommit: bool,
    ) -> Result<u64, DataError> {
        if autocommit {
            let mut conn = self.acquire().await?;
            return Connection::new(&mut *conn, self.dialect).execute(sql, args).await;
        }
        let mut tx = self
            .inner
            .begin()
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        match Connection::new(&mut *tx, self.dialect).execute(sql, args).await {
            Ok(affected) => {
                tx.commit().await.map_err(SqlxErrorExt::into_data_error)?;
                Ok(affected)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Run a read statement, returning at most `limit` rows (all when `None`).
    pub async fn query(
        &self,
        sql: &str,
        args: &[SqlValue],
        limit: Option<usize>,
    ) -> Result<Vec<Row>, DataError> {
        let mut conn = self.acquire().await?;
        Connection::new(&mut *conn, self.dialect)
            .query(sql, args, limit)
            .await
    }

    /// Close every connection. Later acquisitions fail.
    pub async fn close(&self) {
        if self.inner.is_closed() {
            return;
        }
        info!("close database connection pool");
        self.inner.close().await;
    }
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("dialect", &self.dialect)
            .field("autocommit", &self.autocommit)
            .field("size", &self.inner.size())
            .finish()
    }
}

impl Executor for Pool {
    fn query(
        &self,
        sql: &str,
        args: &[SqlValue],
        limit: Option<usize>,
    ) -> impl Future<Output = Result<Vec<Row>, DataError>> + Send {
        Pool::query(self, sql, args, limit)
    }

    fn execute(
        &self,
        sql: &str,
        args: &[SqlValue],
        autocommit: bool,
    ) -> impl Future<Output = Result<u64, DataError>> + Send {
        Pool::execute(self, sql, args, autocommit)
    }

    fn autocommit(&self) -> bool {
        self.autocommit
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }
}

/// A borrowed connection, plain or inside a transaction.
///
/// Takes canonical SQL (`?` placeholders, backtick quoting) and rewrites it
/// for the pool's dialect.
pub struct Connection<'c> {
    conn: &'c mut AnyConnection,
    dialect: Dialect,
}

impl<'c> Connection<'c> {
    fn new(conn: &'c mut AnyConnection, dialect: Dialect) -> Self {
        Self { conn, dialect }
    }

    /// The raw driver connection, for statements outside the model layer.
    pub fn raw(&mut self) -> &mut AnyConnection {
        &mut *self.conn
    }

    pub async fn execute(&mut self, sql: &str, args: &[SqlValue]) -> Result<u64, DataError> {
        let sql = self.dialect.prepare(sql);
        debug!(sql = %sql, args = args.len(), "SQL");
        let result = bind_args(sqlx::query(&sql), args)
            .execute(&mut *self.conn)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        debug!(affected = result.rows_affected(), "rows affected");
        Ok(result.rows_affected())
    }

    pub async fn query(
        &mut self,
        sql: &str,
        args: &[SqlValue],
        limit: Option<usize>,
    ) -> Result<Vec<Row>, DataError> {
        let sql = self.dialect.prepare(sql);
        debug!(sql = %sql, args = args.len(), "SQL");
        let mut rows = Vec::new();
        if limit == Some(0) {
            return Ok(rows);
        }
        let mut stream = bind_args(sqlx::query(&sql), args).fetch(&mut *self.conn);
        while let Some(row) = stream
            .try_next()
            .await
            .map_err(SqlxErrorExt::into_data_error)?
        {
            rows.push(decode_row(&row)?);
            if limit.is_some_and(|n| rows.len() >= n) {
                break;
            }
        }
        debug!(rows = rows.len(), "rows returned");
        Ok(rows)
    }
}
