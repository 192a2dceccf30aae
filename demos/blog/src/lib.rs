//! A small blog on Quill: users, blogs and comments behind a JSON API.

pub mod handlers;
pub mod models;
pub mod password;
pub mod state;

use quill_core::{AppBuilder, QuillConfig};
use quill_data::{DataError, Orm};
use quill_data_sqlx::Pool;
use quill_security::{HmacSessionSigner, SessionConfig};

use crate::models::{Blog, Comment, User};
use crate::state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Create the tables if they do not exist.
pub async fn bootstrap_schema(orm: &Orm<Pool>) -> Result<(), DataError> {
    orm.create_table::<User>().await?;
    orm.create_table::<Blog>().await?;
    orm.create_table::<Comment>().await?;
    Ok(())
}

/// Build the application state on an initialized pool.
pub fn state(pool: Pool, config: &QuillConfig) -> Result<AppState, BoxError> {
    let session = SessionConfig::from_config(config)?;
    let signer = HmacSessionSigner::from_config(&session)?;
    Ok(AppState::new(Orm::new(pool, models::registry()?), session, signer))
}

/// Assemble the app: routes, tracing, panic handling and schema bootstrap.
pub fn app(state: AppState) -> Result<AppBuilder<AppState>, BoxError> {
    Ok(AppBuilder::new()
        .with_state(state)
        .register_routes(handlers::routes()?.into_router())
        .with_tracing()
        .with_catch_panic()
        .on_start(|state| async move {
            bootstrap_schema(&state.orm).await?;
            tracing::info!("schema ready");
            Ok::<(), BoxError>(())
        }))
}
