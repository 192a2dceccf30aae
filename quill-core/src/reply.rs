//! Handler return values and their conversion into HTTP responses.

use std::fmt;

use axum::http::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::error;

use crate::error::HttpError;

pub const TEXT_HTML: &str = "text/html;charset=utf-8";
pub const TEXT_PLAIN: &str = "text/plain;charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json;charset=utf-8";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Prefix marking a text reply as a redirect.
pub const REDIRECT_PREFIX: &str = "redirect:";
/// Key in a mapping reply naming the template to render.
pub const TEMPLATE_KEY: &str = "__template__";

/// Renders a named template with a mapping as context.
pub trait TemplateRenderer: Send + Sync + 'static {
    fn render(
        &self,
        template: &str,
        context: &Map<String, Value>,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// What a handler returns. See [`Reply::into_response_with`] for the mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Bytes(Bytes),
    Text(String),
    Mapping(Map<String, Value>),
    Status(u16),
    StatusMessage(u16, String),
    /// Any other value, sent as `text/plain` in its display form.
    Other(String),
    /// Another reply with `Set-Cookie` values attached.
    WithCookies(Box<Reply>, Vec<String>),
}

impl Reply {
    /// `redirect:<location>` text reply.
    pub fn redirect(location: impl fmt::Display) -> Self {
        Reply::Text(format!("{REDIRECT_PREFIX}{location}"))
    }

    /// Mapping rendered through `template`.
    pub fn template(template: impl Into<String>, context: Map<String, Value>) -> Self {
        let mut context = context;
        context.insert(TEMPLATE_KEY.to_string(), Value::String(template.into()));
        Reply::Mapping(context)
    }

    /// Serialize `value`; objects become a mapping, anything else its JSON text.
    pub fn json(value: impl Serialize) -> Result<Self, HttpError> {
        match serde_json::to_value(value).map_err(|e| HttpError::Internal(e.to_string()))? {
            Value::Object(map) => Ok(Reply::Mapping(map)),
            other => Ok(Reply::Other(other.to_string())),
        }
    }

    pub fn other(value: impl fmt::Display) -> Self {
        Reply::Other(value.to_string())
    }

    /// Attach a `Set-Cookie` header value.
    pub fn with_cookie(self, cookie: impl Into<String>) -> Self {
        match self {
            Reply::WithCookies(inner, mut cookies) => {
                cookies.push(cookie.into());
                Reply::WithCookies(inner, cookies)
            }
            other => Reply::WithCookies(Box::new(other), vec![cookie.into()]),
        }
    }

    /// Convert into a response.
    ///
    /// - `Bytes` → `application/octet-stream`
    /// - `Text` → `text/html`, or a 302 to the remainder when it starts with `redirect:`
    /// - `Mapping` with `__template__` → rendered HTML (500 without a renderer);
    ///   without → JSON
    /// - `Status` in 100..600 → bare status
    /// - `StatusMessage` in 100..600 → that status with a `text/plain` body
    /// - anything else → `text/plain` display form
    pub fn into_response_with(self, renderer: Option<&dyn TemplateRenderer>) -> Response {
        match self {
            Reply::Bytes(body) => with_content_type(StatusCode::OK, OCTET_STREAM, body),
            Reply::Text(text) => match text.strip_prefix(REDIRECT_PREFIX) {
                Some(location) => redirect_response(location),
                None => with_content_type(StatusCode::OK, TEXT_HTML, text),
            },
            Reply::Mapping(mut map) => match map.remove(TEMPLATE_KEY) {
                Some(template) => {
                    let name = match template {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    render_template(renderer, &name, &map)
                }
                None => match serde_json::to_vec(&map) {
                    Ok(body) => with_content_type(StatusCode::OK, APPLICATION_JSON, body),
                    Err(e) => plain_error(format!("failed to encode JSON reply: {e}")),
                },
            },
            Reply::Status(code) => match status_in_range(code) {
                Some(status) => status.into_response(),
                None => with_content_type(StatusCode::OK, TEXT_PLAIN, code.to_string()),
            },
            Reply::StatusMessage(code, message) => match status_in_range(code) {
                Some(status) => with_content_type(status, TEXT_PLAIN, message),
                None => with_content_type(
                    StatusCode::OK,
                    TEXT_PLAIN,
                    Reply::StatusMessage(code, message).to_string(),
                ),
            },
            Reply::Other(text) => with_content_type(StatusCode::OK, TEXT_PLAIN, text),
            Reply::WithCookies(inner, cookies) => {
                let mut response = inner.into_response_with(renderer);
                for cookie in cookies {
                    match HeaderValue::from_str(&cookie) {
                        Ok(value) => {
                            response.headers_mut().append(SET_COOKIE, value);
                        }
                        Err(_) => error!(cookie = %cookie, "dropping invalid Set-Cookie value"),
                    }
                }
                response
            }
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Reply::Text(s) | Reply::Other(s) => f.write_str(s),
            Reply::Mapping(map) => write!(f, "{}", Value::Object(map.clone())),
            Reply::Status(code) => write!(f, "{code}"),
            Reply::StatusMessage(code, message) => write!(f, "({code}, {message})"),
            Reply::WithCookies(inner, _) => inner.fmt(f),
        }
    }
}

impl IntoResponse for Reply {
    /// Normalize without a template renderer.
    fn into_response(self) -> Response {
        self.into_response_with(None)
    }
}

fn status_in_range(code: u16) -> Option<StatusCode> {
    if (100..600).contains(&code) {
        StatusCode::from_u16(code).ok()
    } else {
        None
    }
}

fn with_content_type(status: StatusCode, content_type: &'static str, body: impl Into<axum::body::Body>) -> Response {
    let mut response = (status, body.into()).into_response();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn redirect_response(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = StatusCode::FOUND.into_response();
            response.headers_mut().insert(LOCATION, value);
            response
        }
        Err(_) => plain_error(format!("invalid redirect location: {location:?}")),
    }
}

fn render_template(
    renderer: Option<&dyn TemplateRenderer>,
    name: &str,
    context: &Map<String, Value>,
) -> Response {
    let Some(renderer) = renderer else {
        return plain_error(format!("no template renderer configured for '{name}'"));
    };
    match renderer.render(name, context) {
        Ok(html) => with_content_type(StatusCode::OK, TEXT_HTML, html),
        Err(e) => plain_error(format!("failed to render template '{name}': {e}")),
    }
}

fn plain_error(message: String) -> Response {
    error!("{message}");
    with_content_type(StatusCode::INTERNAL_SERVER_ERROR, TEXT_PLAIN, message)
}

impl From<Bytes> for Reply {
    fn from(b: Bytes) -> Self {
        Reply::Bytes(b)
    }
}

impl From<Vec<u8>> for Reply {
    fn from(b: Vec<u8>) -> Self {
        Reply::Bytes(Bytes::from(b))
    }
}

impl From<String> for Reply {
    fn from(s: String) -> Self {
        Reply::Text(s)
    }
}

impl From<&str> for Reply {
    fn from(s: &str) -> Self {
        Reply::Text(s.to_string())
    }
}

impl From<Map<String, Value>> for Reply {
    fn from(map: Map<String, Value>) -> Self {
        Reply::Mapping(map)
    }
}

impl From<u16> for Reply {
    fn from(code: u16) -> Self {
        Reply::Status(code)
    }
}

impl From<StatusCode> for Reply {
    fn from(status: StatusCode) -> Self {
        Reply::Status(status.as_u16())
    }
}

impl<M: Into<String>> From<(u16, M)> for Reply {
    fn from((code, message): (u16, M)) -> Self {
        Reply::StatusMessage(code, message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_type(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    #[test]
    fn redirect_text() {
        let response = Reply::from("redirect:/signin").into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/signin");
    }

    #[test]
    fn plain_text_is_html() {
        let response = Reply::from("<h1>hi</h1>").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), Some(TEXT_HTML));
    }

    #[test]
    fn bytes_are_octet_stream() {
        let response = Reply::from(vec![1u8, 2, 3]).into_response();
        assert_eq!(content_type(&response), Some(OCTET_STREAM));
    }

    #[test]
    fn mapping_without_template_is_json() {
        let response = Reply::json(serde_json::json!({"a": 1})).unwrap().into_response();
        assert_eq!(content_type(&response), Some(APPLICATION_JSON));
    }

    #[test]
    fn template_without_renderer_is_500() {
        let response = Reply::template("blogs.html", Map::new()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(content_type(&response), Some(TEXT_PLAIN));
    }

    #[test]
    fn status_codes() {
        assert_eq!(Reply::Status(204).into_response().status(), StatusCode::NO_CONTENT);
        let response = Reply::from((404, "gone")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(content_type(&response), Some(TEXT_PLAIN));

        let response = Reply::Status(700).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), Some(TEXT_PLAIN));
        assert_eq!(Reply::Status(99).into_response().status(), StatusCode::OK);
    }

    #[test]
    fn cookies_attach_to_any_shape() {
        let response = Reply::redirect("/")
            .with_cookie("a=1; HttpOnly")
            .with_cookie("b=2")
            .into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 2);
    }
}
