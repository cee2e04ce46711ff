// Logger configuration
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Redact raw payloads before logging them
    pub redaction_enabled: bool,
    /// Replace PII with a short hash instead of a mask so entries can be correlated
    pub hash_for_correlation: bool,
    /// Default filter directive when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON lines instead of coloured human output
    pub json_output: bool,
    /// Payload keys whose values are always masked, matched case-insensitively
    /// on the last dotted segment with underscores ignored
    pub sensitive_fields: Vec<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            redaction_enabled: true,
            hash_for_correlation: true,
            log_level: "info".to_string(),
            json_output: false,
            sensitive_fields: [
                "firstName",
                "lastName",
                "email",
                "phone",
                "dob_day",
                "dob_month",
                "dob_year",
                "ip_address",
                "address",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        }
    }
}
