use error_common::codes;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Carries the caller-facing message, e.g. "EntryId is required"
    #[error("{0}")]
    MissingField(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TrackingError {
    /// Tag written to the "Error Type" column of the error sink
    pub fn error_type(&self) -> &'static str {
        match self {
            TrackingError::MalformedPayload(_) => "MALFORMED_INPUT",
            TrackingError::MissingField(_) | TrackingError::UnknownCategory(_) => {
                "VALIDATION_ERROR"
            }
            TrackingError::Store(_) => "STORAGE_ERROR",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TrackingError::MalformedPayload(_) => codes::validation::MALFORMED_JSON,
            TrackingError::MissingField(_) => codes::validation::MISSING_REQUIRED_FIELD,
            TrackingError::UnknownCategory(_) => codes::validation::UNKNOWN_CATEGORY,
            TrackingError::Store(StoreError::TableNotFound(_)) => codes::storage::TABLE_READ_FAILED,
            TrackingError::Store(StoreError::RowNotFound { .. }) => codes::storage::ROW_NOT_FOUND,
            TrackingError::Store(StoreError::Backend(_)) => codes::storage::BACKEND_UNAVAILABLE,
            TrackingError::Store(_) => codes::storage::TABLE_WRITE_FAILED,
        }
    }
}

impl From<serde_json::Error> for TrackingError {
    fn from(error: serde_json::Error) -> Self {
        TrackingError::MalformedPayload(error.to_string())
    }
}

pub type TrackingResult<T> = std::result::Result<T, TrackingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_are_malformed_input() {
        let err: TrackingError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert_eq!(err.error_type(), "MALFORMED_INPUT");
        assert_eq!(err.code(), codes::validation::MALFORMED_JSON);
    }

    #[test]
    fn test_missing_field_keeps_caller_message() {
        let err = TrackingError::MissingField("EntryId is required".into());
        assert_eq!(err.error_type(), "VALIDATION_ERROR");
        assert_eq!(err.code(), codes::validation::MISSING_REQUIRED_FIELD);
        assert_eq!(err.to_string(), "EntryId is required");
    }
}
