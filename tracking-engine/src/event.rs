use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// One inbound status change, mapped onto its table rows.
///
/// Built once per webhook call by the category mappers and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub key: String,
    pub status: String,
    /// `None` when the payload carried a time that could not be read
    pub updated_at: Option<DateTime<Utc>>,
    /// Target bucket; `None` when the status is not tracked
    pub bucket: Option<String>,
    /// Current-state row in bucket column order
    pub record: Vec<Value>,
    /// History row in history column order
    pub history: Vec<Value>,
}
