use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::LoggerConfig;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("email pattern");
    static ref PHONE_REGEX: Regex = Regex::new(
        r"(?:\+1[-.\s]?)?\(?\b([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})\b"
    )
    .expect("phone pattern");
    static ref SSN_REGEX: Regex = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("ssn pattern");
    static ref IP_REGEX: Regex =
        Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").expect("ip pattern");
}

/// PII redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub enabled: bool,
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_ssn: bool,
    pub redact_ip_addresses: bool,
    pub hash_for_correlation: bool,
    /// Normalized key names (lowercase, no underscores) that are always masked
    pub sensitive_fields: Vec<String>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self::from(&LoggerConfig::default())
    }
}

impl From<&LoggerConfig> for RedactionConfig {
    fn from(config: &LoggerConfig) -> Self {
        Self {
            enabled: config.redaction_enabled,
            redact_emails: true,
            redact_phones: true,
            redact_ssn: true,
            redact_ip_addresses: true,
            hash_for_correlation: config.hash_for_correlation,
            sensitive_fields: config
                .sensitive_fields
                .iter()
                .map(|field| normalize_key(field))
                .collect(),
        }
    }
}

/// `customer.firstName` -> `firstname`, `first_name` -> `firstname`
fn normalize_key(key: &str) -> String {
    key.rsplit('.')
        .next()
        .unwrap_or(key)
        .chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// PII redactor for webhook payloads and log messages
#[derive(Debug, Clone)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl Default for PiiRedactor {
    fn default() -> Self {
        Self::new(RedactionConfig::default())
    }
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn from_logger_config(config: &LoggerConfig) -> Self {
        Self::new(RedactionConfig::from(config))
    }

    /// Redact a raw request body. JSON objects are walked key by key so that
    /// sensitive fields are masked even when their values carry no pattern;
    /// anything else falls back to pattern redaction of the text.
    pub fn redact_payload(&self, raw: &str) -> String {
        if !self.config.enabled {
            return raw.to_string();
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => self.redact_json(&value).to_string(),
            Err(_) => self.redact(raw),
        }
    }

    pub fn redact_json(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, inner)| {
                        let redacted = if self.is_sensitive_key(key) {
                            self.mask_value(inner)
                        } else {
                            self.redact_json(inner)
                        };
                        (key.clone(), redacted)
                    })
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.redact_json(v)).collect()),
            Value::String(text) => Value::String(self.redact(text)),
            other => other.clone(),
        }
    }

    pub fn redact(&self, text: &str) -> String {
        if !self.config.enabled {
            return text.to_string();
        }

        let mut result = text.to_string();

        if self.config.redact_emails {
            result = self.redact_emails(&result);
        }

        if self.config.redact_ssn {
            result = self.redact_ssn(&result);
        }

        if self.config.redact_phones {
            result = self.redact_phones(&result);
        }

        if self.config.redact_ip_addresses {
            result = self.redact_ip_addresses(&result);
        }

        result
    }

    fn is_sensitive_key(&self, key: &str) -> bool {
        let normalized = normalize_key(key);
        self.config.sensitive_fields.iter().any(|f| *f == normalized)
    }

    fn mask_value(&self, value: &Value) -> Value {
        match value {
            Value::Null => Value::Null,
            Value::String(s) if s.is_empty() => Value::String(String::new()),
            other => {
                let text = match other {
                    Value::String(s) => s.clone(),
                    v => v.to_string(),
                };
                if self.config.hash_for_correlation {
                    Value::String(format!("PII[{}]", self.hash_value(&text)))
                } else {
                    Value::String(crate::REDACTED_MARKER.to_string())
                }
            }
        }
    }

    fn redact_emails(&self, text: &str) -> String {
        EMAIL_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                let email = &caps[0];
                if self.config.hash_for_correlation {
                    format!("EMAIL[{}]", self.hash_value(email))
                } else {
                    let mut parts = email.splitn(2, '@');
                    let local = parts.next().and_then(|p| p.chars().next());
                    let domain = parts.next().and_then(|p| p.chars().next());
                    match (local, domain) {
                        (Some(l), Some(d)) => format!("{}***@{}***", l, d),
                        _ => "***@***".to_string(),
                    }
                }
            })
            .to_string()
    }

    fn redact_phones(&self, text: &str) -> String {
        PHONE_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("PHONE[{}]", self.hash_value(&caps[0]))
                } else {
                    "(***) ***-****".to_string()
                }
            })
            .to_string()
    }

    fn redact_ssn(&self, text: &str) -> String {
        SSN_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("SSN[{}]", self.hash_value(&caps[0]))
                } else {
                    "***-**-****".to_string()
                }
            })
            .to_string()
    }

    fn redact_ip_addresses(&self, text: &str) -> String {
        IP_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("IP[{}]", self.hash_value(&caps[0]))
                } else {
                    let ip = &caps[0];
                    let parts: Vec<&str> = ip.split('.').collect();
                    match (parts.first(), parts.last()) {
                        (Some(first), Some(last)) if parts.len() == 4 => {
                            format!("{}.***.***.{}", first, last)
                        }
                        _ => "***.***.***.***".to_string(),
                    }
                }
            })
            .to_string()
    }

    fn hash_value(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        let result = hasher.finalize();
        general_purpose::STANDARD.encode(&result[..8]) // first 8 bytes keep the tag short
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn masking_redactor() -> PiiRedactor {
        PiiRedactor::new(RedactionConfig {
            hash_for_correlation: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_email_redaction() {
        let redacted = masking_redactor().redact("User john.doe@example.com updated order");
        assert!(redacted.contains("j***@e***"));
        assert!(!redacted.contains("john.doe"));
    }

    #[test]
    fn test_phone_redaction() {
        let redacted = masking_redactor().redact("Call me at (555) 123-4567");
        assert!(redacted.contains("(***) ***-****"));
    }

    #[test]
    fn test_sensitive_keys_are_masked_in_json() {
        let payload = json!({
            "_id": "7893efc2581fe0505d48c681",
            "customer.firstName": "Jane",
            "customer.lastName": "Doe",
            "first_name": "Page",
            "status": "pending"
        })
        .to_string();

        let redacted: Value =
            serde_json::from_str(&masking_redactor().redact_payload(&payload)).unwrap();
        assert_eq!(redacted["customer.firstName"], "[REDACTED]");
        assert_eq!(redacted["customer.lastName"], "[REDACTED]");
        assert_eq!(redacted["first_name"], "[REDACTED]");
        assert_eq!(redacted["status"], "pending");
        assert_eq!(redacted["_id"], "7893efc2581fe0505d48c681");
    }

    #[test]
    fn test_hashing_is_stable_for_correlation() {
        let redactor = PiiRedactor::default();
        let a = redactor.redact("jane@example.com");
        let b = redactor.redact("jane@example.com");
        assert_eq!(a, b);
        assert!(a.starts_with("EMAIL["));
    }

    #[test]
    fn test_non_json_payload_falls_back_to_text() {
        let redacted = masking_redactor().redact_payload("{not json jane@example.com");
        assert!(redacted.starts_with("{not json"));
        assert!(!redacted.contains("jane@"));
    }

    #[test]
    fn test_disabled_redaction_passes_through() {
        let redactor = PiiRedactor::new(RedactionConfig {
            enabled: false,
            ..Default::default()
        });
        assert_eq!(redactor.redact_payload("jane@example.com"), "jane@example.com");
    }
}
