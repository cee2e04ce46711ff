use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use tracking_engine::{StoreError, TrackingError};
use uuid::Uuid;

/// Error body for the admin and table endpoints.
///
/// Webhook endpoints never use it; they always answer 200 with an
/// `IngestResponse`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Error type/code
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
    /// Detailed error description for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Timestamp when error occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {resource_type}")]
    NotFound { resource_type: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl ApiError {
    pub fn not_found(resource_type: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Storage(StoreError::TableNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(StoreError::Backend(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "not_found",
            ApiError::BadRequest { .. } => "bad_request",
            ApiError::Storage(_) => "storage_error",
        }
    }
}

impl From<TrackingError> for ApiError {
    fn from(err: TrackingError) -> Self {
        match err {
            TrackingError::UnknownCategory(category) => {
                ApiError::not_found(format!("category {}", category))
            }
            TrackingError::MalformedPayload(message) | TrackingError::MissingField(message) => {
                ApiError::bad_request(message)
            }
            TrackingError::Store(e) => ApiError::Storage(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_id = Uuid::new_v4().to_string();

        if status.is_server_error() {
            error!(error_id = %error_id, error = %self, "Request failed");
        }

        let details = match &self {
            ApiError::Storage(e) => Some(format!("{:?}", e)),
            _ => None,
        };

        let body = ApiErrorResponse {
            error_id,
            error_type: self.error_type().to_string(),
            message: self.to_string(),
            details,
            timestamp: chrono::Utc::now(),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
