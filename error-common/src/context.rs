use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error context carried into the error sink next to the raw payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub additional: BTreeMap<String, String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn add_context<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional.insert(key.into(), value.into());
        self
    }

    /// Compact JSON rendering used for the sink's context column
    pub fn to_cell(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context_renders_as_empty_object() {
        assert_eq!(ErrorContext::new().to_cell(), "{}");
    }

    #[test]
    fn test_context_cell_includes_additional_fields() {
        let cell = ErrorContext::new()
            .with_category("subscriptions")
            .add_context("trigger", "paused")
            .to_cell();
        assert!(cell.contains("\"category\":\"subscriptions\""));
        assert!(cell.contains("\"trigger\":\"paused\""));
    }
}
