//! Error types module
//!
//! All errors raised by Platewatch components are unified under the
//! [`AppError`] enum: database, storage, validation, and the
//! domain-specific materialization failures.

use std::io;

use sqlx::Error as SqlxError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("No active submission for plate {plate} carries a value for required field '{field}'")]
    RequiredFieldUnresolvable { plate: String, field: &'static str },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

impl AppError {
    /// Machine-readable error code, used in logs and by the serving layer.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::ImageProcessing(_) => "IMAGE_PROCESSING_ERROR",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::RequiredFieldUnresolvable { .. } => "REQUIRED_FIELD_UNRESOLVABLE",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::InternalWithSource { .. } => "INTERNAL_ERROR",
        }
    }

    /// HTTP status the serving layer should answer with.
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::Database(_) => 500,
            AppError::Storage(_) => 500,
            AppError::ImageProcessing(_) => 400,
            AppError::InvalidInput(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::PayloadTooLarge(_) => 413,
            AppError::Unauthorized(_) => 401,
            AppError::RequiredFieldUnresolvable { .. } => 500,
            AppError::Internal(_) => 500,
            AppError::InternalWithSource { .. } => 500,
        }
    }

    /// Whether a retry of the same operation may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Database(_)
                | AppError::Storage(_)
                | AppError::Internal(_)
                | AppError::InternalWithSource { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_are_recoverable() {
        let err = AppError::from(sqlx::Error::PoolClosed);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_recoverable());
    }

    #[test]
    fn required_field_error_names_plate_and_field() {
        let err = AppError::RequiredFieldUnresolvable {
            plate: "ABC123".to_string(),
            field: "make",
        };
        assert_eq!(err.error_code(), "REQUIRED_FIELD_UNRESOLVABLE");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("ABC123"));
        assert!(err.to_string().contains("make"));
    }

    #[test]
    fn payload_too_large_maps_to_413() {
        let err = AppError::PayloadTooLarge("12MB exceeds limit".to_string());
        assert_eq!(err.http_status_code(), 413);
        assert!(!err.is_recoverable());
    }
}
