use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

// Add conversion from std::io::Error
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(StorageError::Io(err.to_string()))
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Storage quota exceeded")]
    QuotaExceeded,

    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialize(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Request not found: {0}")]
    RequestNotFound(Uuid),

    #[error("Offer not found: {0}")]
    OfferNotFound(Uuid),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("No account for email: {0}")]
    EmailNotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion() {
        // Test IO error conversion
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Storage(StorageError::Io(_))));

        // Test config error conversion
        let config_err = config::ConfigError::NotFound(String::from("key not found"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::ConfigError(_)));

        // Test JSON error conversion
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let storage_err: StorageError = json_err.into();
        assert!(matches!(storage_err, StorageError::Serialize(_)));
    }

    #[test]
    fn test_error_display() {
        let err = AppError::ValidationError("test error".to_string());
        assert_eq!(err.to_string(), "Validation error: test error");

        let err = AppError::Storage(StorageError::QuotaExceeded);
        assert_eq!(err.to_string(), "Storage error: Storage quota exceeded");

        let id = Uuid::new_v4();
        let err = AppError::Service(ServiceError::RequestNotFound(id));
        assert_eq!(
            err.to_string(),
            format!("Service error: Request not found: {}", id)
        );
    }

    #[test]
    fn test_not_found_carries_id() {
        let id = Uuid::new_v4();
        let err = ServiceError::OfferNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }
}
