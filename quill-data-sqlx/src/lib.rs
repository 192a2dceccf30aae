//! SQLx backend for the Quill data layer.
//!
//! Provides [`Pool`], a connection pool over `sqlx::any` that implements
//! [`quill_data::Executor`], so an [`Orm`](quill_data::Orm) can run on it
//! directly.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Pool`] | Pooled connections; `execute`, `query`, `with_connection`, `transaction`, `close` |
//! | [`Connection`] | A borrowed connection inside `with_connection` / `transaction` |
//! | [`PoolConfig`] | Pool settings, read from `database.*` config keys |
//! | [`global`] | Process-wide pool handle |
//! | [`SqlxErrorExt`] | `sqlx::Error` → `DataError` (`.into_data_error()`) |
//!
//! # Feature flags
//!
//! | Feature    | Driver |
//! |------------|--------|
//! | `mysql`    | MySQL via `sqlx/mysql` (default) |
//! | `sqlite`   | SQLite via `sqlx/sqlite` (default) |
//! | `postgres` | PostgreSQL via `sqlx/postgres` |
//!
//! # Quick start
//!
//! ```ignore
//! use quill_data_sqlx::{Pool, PoolConfig};
//!
//! let pool = Pool::initialize(PoolConfig::from_config(&config)?).await?;
//! let orm = Orm::new(pool.clone(), registry);
//! let blogs = orm.find_all::<Blog>(FindAll::new().order_by("created_at desc")).await?;
//! ```

pub mod config;
pub mod error;
pub mod global;
pub mod pool;
mod row;

pub use config::{Driver, PoolConfig};
pub use error::{SqlxErrorExt, SqlxResult};
pub use pool::{Connection, Pool};

/// Re-exports of the most commonly used types from both `quill-data` and this crate.
pub mod prelude {
    pub use crate::{Connection, Pool, PoolConfig, SqlxErrorExt};
    pub use quill_data::prelude::*;
}
