//! Process-wide pool handle.
//!
//! ```ignore
//! quill_data_sqlx::global::init(PoolConfig::from_config(&config)?).await?;
//! let pool = quill_data_sqlx::global::pool()?;
//! // on shutdown
//! quill_data_sqlx::global::close().await;
//! ```

use quill_data::DataError;
use tokio::sync::OnceCell;

use crate::config::PoolConfig;
use crate::pool::Pool;

static POOL: OnceCell<Pool> = OnceCell::const_new();

/// Initialize the global pool once. Later calls return the existing pool
/// and ignore `config`.
pub async fn init(config: PoolConfig) -> Result<&'static Pool, DataError> {
    POOL.get_or_try_init(|| Pool::initialize(config)).await
}

/// The global pool; a configuration error before [`init`].
pub fn pool() -> Result<&'static Pool, DataError> {
    POOL.get()
        .ok_or_else(|| DataError::configuration("database pool is not initialized"))
}

/// Close the global pool if it was initialized.
pub async fn close() {
    if let Some(pool) = POOL.get() {
        pool.close().await;
    }
}
