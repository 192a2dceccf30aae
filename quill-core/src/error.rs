use crate::http::response::{IntoResponse, Response};
use crate::http::{Json, StatusCode};

/// Helper to create a JSON error response with a standard `{ "error": message }` body.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, Json(body)).into_response()
}

/// Domain error with a machine-readable code, the offending datum, and a
/// human message. Rendered as `{"error", "data", "message"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    error: String,
    data: String,
    message: String,
}

impl ApiError {
    pub const VALUE_INVALID: &'static str = "value:invalid";
    pub const VALUE_NOT_FOUND: &'static str = "value:notfound";
    pub const PERMISSION_FORBIDDEN: &'static str = "permission:forbidden";

    pub fn new(
        error: impl Into<String>,
        data: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            data: data.into(),
            message: message.into(),
        }
    }

    /// Input value is invalid; `field` names the input.
    pub fn value_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Self::VALUE_INVALID, field, message)
    }

    /// Referenced resource does not exist.
    pub fn value_not_found(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Self::VALUE_NOT_FOUND, field, message)
    }

    pub fn permission_forbidden(message: impl Into<String>) -> Self {
        Self::new(Self::PERMISSION_FORBIDDEN, "permission", message)
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 404 for `value:notfound`, 403 for `permission:*`, 400 otherwise.
    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            Self::VALUE_NOT_FOUND => StatusCode::NOT_FOUND,
            e if e.starts_with("permission:") => StatusCode::FORBIDDEN,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.error,
            "data": self.data,
            "message": self.message,
        })
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.error, self.data, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_json())).into_response()
    }
}

pub enum HttpError {
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    Internal(String),
    /// Invalid or missing input, reported in the `ApiError` shape with
    /// `value:invalid` and the field name as `data`.
    Validation {
        field: String,
        message: String,
    },
    Api(ApiError),
    Custom {
        status: StatusCode,
        body: serde_json::Value,
    },
}

impl HttpError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        HttpError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            HttpError::Forbidden(_) => StatusCode::FORBIDDEN,
            HttpError::BadRequest(_) | HttpError::Validation { .. } => StatusCode::BAD_REQUEST,
            HttpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HttpError::Api(err) => err.status(),
            HttpError::Custom { status, .. } => *status,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::Validation { field, message } => {
                ApiError::value_invalid(field, message).into_response()
            }
            HttpError::Api(err) => err.into_response(),
            HttpError::Custom { status, body } => (status, Json(body)).into_response(),
            other => {
                let status = other.status();
                let message = match other {
                    HttpError::NotFound(msg)
                    | HttpError::Unauthorized(msg)
                    | HttpError::Forbidden(msg)
                    | HttpError::BadRequest(msg)
                    | HttpError::Internal(msg) => msg,
                    HttpError::Validation { .. } | HttpError::Api(_) | HttpError::Custom { .. } => {
                        unreachable!()
                    }
                };
                error_response(status, message)
            }
        }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            HttpError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            HttpError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            HttpError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            HttpError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            HttpError::Validation { field, message } => {
                write!(f, "Validation Error: {field}: {message}")
            }
            HttpError::Api(err) => write!(f, "API Error: {err}"),
            HttpError::Custom { status, body } => write!(f, "Custom Error ({status}): {body}"),
        }
    }
}

impl std::fmt::Debug for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for HttpError {}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        HttpError::Api(err)
    }
}

impl From<std::io::Error> for HttpError {
    fn from(err: std::io::Error) -> Self {
        HttpError::Internal(err.to_string())
    }
}

/// Registration-time failure of a route table.
#[derive(Debug)]
pub enum RouteError {
    /// The request parameter is followed by a plain positional parameter.
    RequestNotLast { handler: String, param: String },
    /// The same parameter name is declared twice.
    DuplicateParam { handler: String, param: String },
    /// The same method and path were registered twice.
    DuplicateRoute { method: String, path: String },
    /// The HTTP method cannot be routed.
    UnsupportedMethod(String),
}

impl std::fmt::Display for RouteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteError::RequestNotLast { handler, param } => write!(
                f,
                "request parameter must be the last named parameter in function: {handler}({param})"
            ),
            RouteError::DuplicateParam { handler, param } => {
                write!(f, "parameter '{param}' declared twice in {handler}")
            }
            RouteError::DuplicateRoute { method, path } => {
                write!(f, "route {method} {path} registered twice")
            }
            RouteError::UnsupportedMethod(method) => write!(f, "unsupported method: {method}"),
        }
    }
}

impl std::error::Error for RouteError {}
