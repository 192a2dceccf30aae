/// Errors that can occur in the data layer.
#[derive(Debug)]
pub enum DataError {
    /// Bad model registration or pool setup. Raised before serving traffic.
    Configuration(String),
    /// Bad caller input, e.g. a malformed limit shape.
    Validation { field: String, message: String },
    /// A stored value could not be converted into the requested Rust type.
    Conversion { field: String, expected: &'static str },
    NotFound(String),
    /// Driver or connection failure, carrying the original error.
    Database(Box<dyn std::error::Error + Send + Sync>),
}

impl DataError {
    /// Construct a `Database` variant from any error type.
    ///
    /// Used by backend crates (e.g. `quill-data-sqlx`) to wrap
    /// driver-specific errors.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        DataError::Configuration(message.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DataError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            DataError::Validation { field, message } => {
                write!(f, "Invalid value for '{field}': {message}")
            }
            DataError::Conversion { field, expected } => {
                write!(f, "Cannot convert '{field}' to {expected}")
            }
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::Database(err) => write!(f, "Database error: {err}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Database(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<DataError> for quill_core::HttpError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Validation { field, message } => {
                quill_core::HttpError::Validation { field, message }
            }
            DataError::NotFound(msg) => quill_core::HttpError::NotFound(msg),
            DataError::Database(e) => {
                tracing::error!(error = %e, "database error");
                quill_core::HttpError::Internal("Database error".into())
            }
            other => {
                tracing::error!(error = %other, "data layer error");
                quill_core::HttpError::Internal(other.to_string())
            }
        }
    }
}
