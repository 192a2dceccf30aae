//! Quill prelude: everything a handler module needs with a single `use`.
//!
//! ```ignore
//! use quill_core::prelude::*;
//!
//! async fn api_get_blog(state: AppState, call: Call) -> Result<Reply, HttpError> {
//!     let id: String = call.require("id")?;
//!     ...
//! }
//! ```

pub use crate::builder::AppBuilder;
pub use crate::config::QuillConfig;
pub use crate::dispatcher::{Call, Dispatcher, RequestContext};
pub use crate::error::{ApiError, HttpError, RouteError};
pub use crate::http::{Json, Method, StatusCode};
pub use crate::kwargs::Kwargs;
pub use crate::reply::{Reply, TemplateRenderer};
pub use crate::signature::Signature;
