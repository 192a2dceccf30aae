//! Quill core: declared handler signatures, the request dispatcher, the
//! reply normalizer, configuration, tracing setup and the app builder.

pub mod builder;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod kwargs;
pub mod layers;
pub mod prelude;
pub mod reply;
pub mod signature;

pub use builder::{AppBuilder, NoState};
pub use config::{ConfigError, ConfigValue, FromConfigValue, QuillConfig};
pub use dispatcher::{bind_arguments, Call, Dispatcher, Endpoint, RequestContext};
pub use error::{error_response, ApiError, HttpError, RouteError};
pub use kwargs::Kwargs;
pub use layers::{catch_panic_layer, default_trace, init_tracing};
pub use reply::{Reply, TemplateRenderer};
pub use signature::{Classification, Param, ParamKind, Signature};
