//! Embeddables form-fill progress

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{text_cell, Fields};
use crate::error::{TrackingError, TrackingResult};
use crate::timestamp::timestamp_cell;

pub const CATEGORY: &str = "page_tracker";

pub const TRACKER_HEADERS: &[&str] = &[
    "First Started",
    "Last Updated Timestamp",
    "Entry ID",
    "Form Source",
    "Current Page Key",
    "Current Page ID",
    "Current Page Index",
    "First Name",
    "Last Name",
    "Email",
    "Phone",
    "State",
    "Attributes",
    "Furthest Page Reached",
    "Furthest Page Index",
];

pub const LOG_HEADERS: &[&str] = &[
    "Timestamp",
    "Entry ID",
    "Form Source",
    "Current Page Key",
    "Current Page ID",
    "Current Page Index",
    "First Name",
    "Last Name",
    "Email",
    "Phone",
    "State",
    "Attributes",
];

pub const FIRST_STARTED_COLUMN: usize = 0;
pub const ENTRY_ID_COLUMN: usize = 2;
pub const FURTHEST_REACHED_COLUMN: usize = 13;
pub const FURTHEST_INDEX_COLUMN: usize = 14;

const MAPPED_FIELDS: &[&str] = &[
    "entryId",
    "form_source",
    "current_page_key",
    "current_page_id",
    "current_page_index",
    "first_name",
    "last_name",
    "email",
    "phone",
    "state",
];

/// Integer prefix of a value the way form tools send page indexes:
/// `3`, `"3"`, `" 3 "` and `"3rd"` are all 3, anything else is 0.
pub fn page_index(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => leading_int(s),
        _ => 0,
    }
}

fn leading_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits
        .get(..end)
        .and_then(|d| d.parse::<i64>().ok())
        .map_or(0, |n| sign * n)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageSubmission {
    pub entry_id: String,
    pub form_source: Option<String>,
    pub current_page_key: Option<String>,
    pub current_page_id: Option<String>,
    /// Index as sent, for display
    pub current_page_index: Option<String>,
    pub page_index: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub state: Option<String>,
    /// Everything else in the body, kept as one JSON column
    pub attributes: serde_json::Map<String, Value>,
}

impl PageSubmission {
    pub fn from_fields(fields: &Fields) -> TrackingResult<Self> {
        let entry_id = fields
            .text("entryId")
            .ok_or_else(|| TrackingError::MissingField("EntryId is required".into()))?;

        Ok(Self {
            entry_id,
            form_source: fields.text("form_source"),
            current_page_key: fields.text("current_page_key"),
            current_page_id: fields.text("current_page_id"),
            current_page_index: fields.text("current_page_index"),
            page_index: page_index(fields.get("current_page_index")),
            first_name: fields.text("first_name"),
            last_name: fields.text("last_name"),
            email: fields.text("email"),
            phone: fields.text("phone"),
            state: fields.text("state").map(|s| s.to_uppercase()),
            attributes: fields.remainder(MAPPED_FIELDS),
        })
    }

    fn detail_cells(&self) -> Vec<Value> {
        vec![
            text_cell(self.form_source.clone()),
            text_cell(self.current_page_key.clone()),
            text_cell(self.current_page_id.clone()),
            text_cell(self.current_page_index.clone()),
            text_cell(self.first_name.clone()),
            text_cell(self.last_name.clone()),
            text_cell(self.email.clone()),
            text_cell(self.phone.clone()),
            text_cell(self.state.clone()),
            Value::String(Value::Object(self.attributes.clone()).to_string()),
        ]
    }

    pub fn tracker_row(
        &self,
        first_started: Value,
        now: DateTime<Utc>,
        furthest_reached: Value,
        furthest_index: i64,
    ) -> Vec<Value> {
        let mut row = vec![
            first_started,
            timestamp_cell(now),
            Value::String(self.entry_id.clone()),
        ];
        row.extend(self.detail_cells());
        row.push(furthest_reached);
        row.push(Value::from(furthest_index));
        row
    }

    pub fn log_row(&self, now: DateTime<Utc>) -> Vec<Value> {
        let mut row = vec![timestamp_cell(now), Value::String(self.entry_id.clone())];
        row.extend(self.detail_cells());
        row
    }
}
