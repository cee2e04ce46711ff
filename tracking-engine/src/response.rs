use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::TrackingError;

/// Body returned by every webhook endpoint.
///
/// Serializes as `{result, success, message, id?, error?, ...context}`;
/// callers read the embedded flag, not the HTTP status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestResponse {
    pub result: &'static str,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub context: Map<String, Value>,
}

impl IngestResponse {
    pub fn success(message: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            result: "success",
            success: true,
            message: message.into(),
            id: Some(id.into()),
            error: None,
            context: Map::new(),
        }
    }

    pub fn failure(message: impl Into<String>, error: &TrackingError) -> Self {
        Self {
            result: "error",
            success: false,
            message: message.into(),
            id: None,
            error: Some(error.to_string()),
            context: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}
