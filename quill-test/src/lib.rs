mod app;
mod path;

pub use app::{TestApp, TestRequest, TestResponse};
pub use path::json_at;
