//! Categories that only ever append to their own table

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{text_cell, Fields};
use crate::timestamp::{parse_timestamp_value, timestamp_cell};

pub const APPEND_HEADERS: &[&str] = &[
    "Datetime Received",
    "Key",
    "Status",
    "Last Updated",
    "Raw Data",
];

const KEY_FIELDS: &[&str] = &["id", "_id", "entryId", "sessionId"];

#[derive(Debug, Clone, PartialEq)]
pub struct AppendOnlyEntry {
    pub key: Option<String>,
    pub status: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AppendOnlyEntry {
    pub fn from_fields(fields: &Fields) -> Self {
        Self {
            key: fields.first_text(KEY_FIELDS),
            status: fields.text("status"),
            updated_at: fields
                .get("updatedAt")
                .or_else(|| fields.get("createdAt"))
                .and_then(parse_timestamp_value),
        }
    }

    pub fn row(&self, raw: &str, received_at: DateTime<Utc>) -> Vec<Value> {
        vec![
            timestamp_cell(received_at),
            text_cell(self.key.clone()),
            text_cell(self.status.clone()),
            self.updated_at.map_or(Value::Null, timestamp_cell),
            Value::String(raw.to_string()),
        ]
    }
}
