use std::sync::Arc;

use quill_data::Orm;
use quill_data_sqlx::Pool;
use quill_security::{HmacSessionSigner, SessionConfig};

#[derive(Clone)]
pub struct AppState {
    pub orm: Orm<Pool>,
    pub session: SessionConfig,
    pub signer: Arc<HmacSessionSigner>,
}

impl AppState {
    pub fn new(orm: Orm<Pool>, session: SessionConfig, signer: HmacSessionSigner) -> Self {
        Self {
            orm,
            session,
            signer: Arc::new(signer),
        }
    }
}
