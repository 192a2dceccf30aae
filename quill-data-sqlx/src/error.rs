use quill_data::DataError;

/// Extension trait for converting `sqlx::Error` into `DataError`.
///
/// Orphan rules keep `From<sqlx::Error> for DataError` out of this crate,
/// so call `.into_data_error()` at the driver boundary.
pub trait SqlxErrorExt {
    fn into_data_error(self) -> DataError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_data_error(self) -> DataError {
        match &self {
            sqlx::Error::RowNotFound => DataError::NotFound("Row not found".into()),
            sqlx::Error::Configuration(e) => DataError::configuration(e.to_string()),
            _ => DataError::database(self),
        }
    }
}

/// Convenience alias for data-layer results using `DataError`.
pub type SqlxResult<T> = Result<T, DataError>;
