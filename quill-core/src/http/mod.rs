//! HTTP types used across Quill, re-exported so applications do not
//! need a direct axum dependency.

pub mod response {
    pub use axum::response::{IntoResponse, Response};
}

pub use axum::body::Body;
pub use axum::extract::Request;
pub use axum::http::header::{
    self, CONTENT_TYPE, COOKIE, LOCATION, REFERER, SET_COOKIE,
};
pub use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
pub use axum::{serve, Json, Router};
pub use bytes::Bytes;

pub use self::response::{IntoResponse, Response};
