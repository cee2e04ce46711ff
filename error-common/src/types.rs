use thiserror::Error;

use crate::codes;

/// Error enum shared by the service boundary
#[derive(Error, Debug)]
pub enum WebhookError {
    /// Table store failures
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Network communication errors
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server runtime errors
    #[error("Server error: {0}")]
    ServerError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl WebhookError {
    /// Tag used in structured logs next to the error code
    pub fn error_type(&self) -> &'static str {
        match self {
            WebhookError::StorageError(_) => "STORAGE_ERROR",
            WebhookError::NetworkError(_) => "NETWORK_ERROR",
            WebhookError::ServerError(_) => "SERVER_ERROR",
            WebhookError::ConfigError(_) => "CONFIGURATION_ERROR",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            WebhookError::StorageError(_) => codes::storage::TABLE_WRITE_FAILED,
            WebhookError::NetworkError(_) => codes::system::NETWORK,
            WebhookError::ServerError(_) => codes::system::SERVER,
            WebhookError::ConfigError(_) => codes::system::CONFIGURATION,
        }
    }
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, WebhookError>;

/// Async logging function for errors
pub async fn log_error(context: &str, error: &WebhookError) {
    tracing::error!(
        context = context,
        error_type = error.error_type(),
        error_code = error.code(),
        error = %error,
        "Tracker error occurred"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_tags() {
        assert_eq!(
            WebhookError::ConfigError("missing port".into()).error_type(),
            "CONFIGURATION_ERROR"
        );
        assert_eq!(
            WebhookError::NetworkError("address in use".into()).code(),
            codes::system::NETWORK
        );
    }

    #[test]
    fn test_display_keeps_message() {
        let err = WebhookError::StorageError("table full_log unavailable".into());
        assert_eq!(err.to_string(), "Storage error: table full_log unavailable");
        assert_eq!(err.code(), codes::storage::TABLE_WRITE_FAILED);
    }
}
