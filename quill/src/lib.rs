//! Quill: blog infrastructure over Axum.
//!
//! This facade re-exports the Quill crates through a single dependency
//! with feature flags:
//!
//! ```ignore
//! use quill::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature     | Default | Crate                       |
//! |-------------|---------|-----------------------------|
//! | `data`      | **yes** | `quill-data` (models, ORM)  |
//! | `security`  | **yes** | `quill-security` (sessions) |
//! | `data-sqlx` | no      | `quill-data-sqlx` (pool)    |
//! | `sqlite`    | no      | `quill-data-sqlx/sqlite`    |
//! | `postgres`  | no      | `quill-data-sqlx/postgres`  |
//! | `mysql`     | no      | `quill-data-sqlx/mysql`     |
//! | `full`      | no      | All of the above            |

pub use quill_core;

// Everything from quill-core at the top level.
pub use quill_core::*;

#[cfg(feature = "data")]
pub use quill_data;

#[cfg(feature = "data-sqlx")]
pub use quill_data_sqlx;

#[cfg(feature = "security")]
pub use quill_security;

/// `model_fields!` at the facade root, for `quill::model_fields!(...)`.
#[cfg(feature = "data")]
pub use quill_data::model_fields;

pub mod prelude {
    //! One import for handler and model modules.
    pub use quill_core::prelude::*;

    #[cfg(feature = "data")]
    pub use quill_data::prelude::*;

    #[cfg(feature = "data-sqlx")]
    pub use quill_data_sqlx::{Pool, PoolConfig};

    #[cfg(feature = "security")]
    pub use quill_security::prelude::*;
}
