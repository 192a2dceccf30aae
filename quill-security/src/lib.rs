//! Signed session cookies for Quill applications.
//!
//! ```ignore
//! let config = SessionConfig::from_config(&app_config)?;
//! let signer = HmacSessionSigner::from_config(&config)?;
//!
//! // sign in
//! let token = signer.issue(&user_id, config.max_age_secs);
//! Reply::redirect("/").with_cookie(session_cookie(&config.cookie_name, &token, config.max_age_secs))
//!
//! // later requests
//! let user_id = session_user(call.request()?, &config, &signer);
//! ```

pub mod config;
pub mod error;
pub mod session;

pub use config::SessionConfig;
pub use error::SessionError;
pub use session::{
    clear_session_cookie, session_cookie, session_user, HmacSessionSigner, SessionSigner,
};

pub mod prelude {
    //! Re-exports of the most commonly used security types.
    pub use crate::{session_cookie, session_user, HmacSessionSigner, SessionConfig, SessionSigner};
}
