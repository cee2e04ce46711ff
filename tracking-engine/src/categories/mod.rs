//! Typed payloads for each webhook category and their column layouts

pub mod append_only;
pub mod orders;
pub mod page;
pub mod subscriptions;

use serde_json::{Map, Value};

use crate::error::{TrackingError, TrackingResult};

/// Parsed webhook body.
///
/// CarePortals flattens nested objects into dotted keys (`customer._id`)
/// but not consistently, so lookups try the flat key first and then walk
/// the nested objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    map: Map<String, Value>,
}

impl Fields {
    /// Parse a raw body, which must be a JSON object
    pub fn parse(raw: &str) -> TrackingResult<Self> {
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(Self { map }),
            other => Err(TrackingError::MalformedPayload(format!(
                "expected a JSON object, got {}",
                json_type(&other)
            ))),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.map.get(path) {
            return Some(value);
        }
        let mut segments = path.split('.');
        let mut current = self.map.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Non-empty text at `path`; numbers and bools are rendered
    pub fn text(&self, path: &str) -> Option<String> {
        let text = match self.get(path)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    /// First non-empty text among `paths`
    pub fn first_text(&self, paths: &[&str]) -> Option<String> {
        paths.iter().find_map(|path| self.text(path))
    }

    /// Top-level entries not listed in `known`
    pub fn remainder(&self, known: &[&str]) -> Map<String, Value> {
        self.map
            .iter()
            .filter(|(key, _)| !known.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub(crate) fn text_cell(value: Option<String>) -> Value {
    Value::String(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_and_nested_lookups() {
        let fields = Fields::parse(
            r#"{"customer._id":"c1","product":{"_id":"p1"},"id":9876,"blank":"  "}"#,
        )
        .unwrap();

        assert_eq!(fields.text("customer._id").as_deref(), Some("c1"));
        assert_eq!(fields.text("product._id").as_deref(), Some("p1"));
        assert_eq!(fields.text("id").as_deref(), Some("9876"));
        assert_eq!(fields.text("blank"), None);
        assert_eq!(fields.text("missing.path"), None);
    }

    #[test]
    fn test_non_object_body_is_malformed() {
        assert!(matches!(
            Fields::parse("[1,2]"),
            Err(TrackingError::MalformedPayload(_))
        ));
        assert!(matches!(
            Fields::parse("{oops"),
            Err(TrackingError::MalformedPayload(_))
        ));
    }
}
