//! Timestamp parsing and the replace-if-newer decision

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    // en-US locale rendering found in older sheets
    "%m/%d/%Y, %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y, %H:%M:%S",
];

/// Parse a text timestamp.
///
/// Accepts RFC 3339, naive ISO-8601 (read as UTC), the en-US locale form
/// and a bare integer as epoch milliseconds.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    text.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)
}

/// Parse a JSON value as a timestamp.
///
/// Numbers and digit-only strings are always epoch *milliseconds*; a seconds
/// value such as `1721901900` lands in January 1970 and will lose every
/// comparison.
pub fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_timestamp(text),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Cell form of a timestamp
pub fn timestamp_cell(ts: DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339())
}

/// An event time as it arrived in a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingTimestamp {
    Parsed(DateTime<Utc>),
    /// Field missing, null or blank
    Absent,
    /// Field present but not a timestamp; holds its text form
    Invalid(String),
}

impl IncomingTimestamp {
    pub fn from_field(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => IncomingTimestamp::Absent,
            Some(Value::String(text)) if text.trim().is_empty() => IncomingTimestamp::Absent,
            Some(value) => match parse_timestamp_value(value) {
                Some(ts) => IncomingTimestamp::Parsed(ts),
                None => IncomingTimestamp::Invalid(match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                }),
            },
        }
    }

    /// Time used for reconciliation. Only an absent field falls back to
    /// `received_at`; an unreadable one has no usable time.
    pub fn resolve(&self, received_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            IncomingTimestamp::Parsed(ts) => Some(*ts),
            IncomingTimestamp::Absent => Some(received_at),
            IncomingTimestamp::Invalid(_) => None,
        }
    }

    /// Cell written to the event's rows; unreadable input is kept verbatim
    pub fn cell(&self, received_at: DateTime<Utc>) -> Value {
        match self {
            IncomingTimestamp::Invalid(text) => Value::String(text.clone()),
            other => other.resolve(received_at).map_or(Value::Null, timestamp_cell),
        }
    }
}

/// What a stored timestamp cell holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredTimestamp {
    Parsed(DateTime<Utc>),
    /// Null, empty, or text that is not a timestamp
    Missing,
    /// A JSON type that can never be compared (bool, array, object)
    Incomparable,
}

impl StoredTimestamp {
    pub fn from_cell(cell: &Value) -> Self {
        match cell {
            Value::Null => StoredTimestamp::Missing,
            Value::String(_) | Value::Number(_) => parse_timestamp_value(cell)
                .map_or(StoredTimestamp::Missing, StoredTimestamp::Parsed),
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => StoredTimestamp::Incomparable,
        }
    }
}

/// Outcome of comparing an incoming event against a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Supersession {
    /// Incoming is strictly newer; the stored record goes
    Replace,
    /// Stored record stays authoritative (equal, older incoming, or unknown stored time)
    Keep,
    /// Comparison failed; the stored record goes so the newest write wins
    ReplaceFailOpen,
}

/// Decide whether an event at `incoming` supersedes the record holding `stored`.
///
/// Equal timestamps keep the existing record.
pub fn supersedes(stored: &Value, incoming: DateTime<Utc>) -> Supersession {
    match StoredTimestamp::from_cell(stored) {
        StoredTimestamp::Parsed(existing) if incoming > existing => Supersession::Replace,
        StoredTimestamp::Parsed(_) | StoredTimestamp::Missing => Supersession::Keep,
        StoredTimestamp::Incomparable => Supersession::ReplaceFailOpen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_parses_supported_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 7, 25, 10, 5, 0).unwrap();

        assert_eq!(parse_timestamp("2024-07-25T10:05:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-07-25T06:05:00-04:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-07-25T10:05:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-07-25 10:05:00"), Some(expected));
        assert_eq!(parse_timestamp("07/25/2024, 10:05:00 AM"), Some(expected));
        assert_eq!(parse_timestamp("1721901900000"), Some(expected));
        assert_eq!(parse_timestamp_value(&json!(1_721_901_900_000_i64)), Some(expected));

        // seconds are still read as milliseconds
        let seconds = parse_timestamp_value(&json!(1_721_901_900_i64)).unwrap();
        assert_eq!(seconds.year(), 1970);
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp_value(&json!(true)), None);
    }

    #[test]
    fn test_incoming_absent_and_invalid_differ() {
        let received = at(500);

        let absent = IncomingTimestamp::from_field(None);
        assert_eq!(absent.resolve(received), Some(received));
        assert_eq!(IncomingTimestamp::from_field(Some(&json!(""))), IncomingTimestamp::Absent);
        assert_eq!(IncomingTimestamp::from_field(Some(&Value::Null)), IncomingTimestamp::Absent);

        let garbage = IncomingTimestamp::from_field(Some(&json!("garbage")));
        assert_eq!(garbage, IncomingTimestamp::Invalid("garbage".into()));
        assert_eq!(garbage.resolve(received), None);
        assert_eq!(garbage.cell(received), json!("garbage"));

        let parsed = IncomingTimestamp::from_field(Some(&json!("1970-01-01T00:01:40Z")));
        assert_eq!(parsed.resolve(received), Some(at(100)));
    }

    #[test]
    fn test_strictly_newer_replaces() {
        let stored = timestamp_cell(at(100));
        assert_eq!(supersedes(&stored, at(200)), Supersession::Replace);
        assert_eq!(supersedes(&stored, at(50)), Supersession::Keep);
    }

    #[test]
    fn test_equal_timestamps_keep_existing() {
        let stored = timestamp_cell(at(100));
        assert_eq!(supersedes(&stored, at(100)), Supersession::Keep);
    }

    #[test]
    fn test_missing_or_unparseable_stored_time_keeps() {
        assert_eq!(supersedes(&Value::Null, at(100)), Supersession::Keep);
        assert_eq!(supersedes(&json!(""), at(100)), Supersession::Keep);
        assert_eq!(supersedes(&json!("not a date"), at(100)), Supersession::Keep);
    }

    #[test]
    fn test_incomparable_stored_time_fails_open() {
        assert_eq!(supersedes(&json!(true), at(100)), Supersession::ReplaceFailOpen);
        assert_eq!(supersedes(&json!({"t": 1}), at(100)), Supersession::ReplaceFailOpen);
    }
}
