use quill_core::http::response::{IntoResponse, Response};
use quill_core::http::StatusCode;

/// Reasons a session token is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Not in `<id>-<expiry>-<signature>` form.
    Malformed,

    /// The expiry has passed.
    Expired,

    /// The signature does not match the id and expiry.
    BadSignature,

    /// The signer was built with an empty secret.
    EmptySecret,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Malformed => write!(f, "Malformed session token"),
            SessionError::Expired => write!(f, "Session expired"),
            SessionError::BadSignature => write!(f, "Invalid session signature"),
            SessionError::EmptySecret => write!(f, "Session secret must not be empty"),
        }
    }
}

impl std::error::Error for SessionError {}

impl SessionError {
    pub fn public_message(&self) -> &'static str {
        "Unauthorized"
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.public_message() });
        (StatusCode::UNAUTHORIZED, quill_core::http::Json(body)).into_response()
    }
}

impl From<SessionError> for quill_core::HttpError {
    fn from(err: SessionError) -> Self {
        quill_core::HttpError::Unauthorized(err.public_message().to_string())
    }
}
