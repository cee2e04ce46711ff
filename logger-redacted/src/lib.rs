pub mod redactor;
pub mod macros;
pub mod config;

pub use redactor::*;
pub use config::*;

/// PII-aware logging support for webhook payloads
///
/// Inbound CRM and form payloads carry names, emails, phone numbers, dates of
/// birth and IP addresses. Raw bodies are logged for debugging, so they are run
/// through [`PiiRedactor`] first. The error sink tables still receive the
/// unredacted payload; only the log stream is scrubbed.
///
/// # Detected Data Types
///
/// - **Email Addresses**: user@example.com → u***@e***
/// - **Phone Numbers**: (555) 123-4567 → (***) ***-****
/// - **SSN**: 123-45-6789 → ***-**-****
/// - **IP Addresses**: 192.168.1.1 → 192.***.***.1
/// - **Sensitive keys**: any JSON value under a configured key such as
///   `customer.firstName` or `dob_year`
///
/// With `hash_for_correlation` enabled every match becomes a short SHA-256
/// tag (`EMAIL[k3Jd...]`) so the same customer can be followed across entries.
///
/// # Example
///
/// ```rust
/// use logger_redacted::{LoggerConfig, PiiRedactor};
///
/// let redactor = PiiRedactor::from_logger_config(&LoggerConfig::default());
/// let raw = r#"{"customer.email":"jane@example.com","status":"pending"}"#;
/// let safe = redactor.redact_payload(raw);
/// assert!(!safe.contains("jane@example.com"));
/// assert!(safe.contains("pending"));
///
/// logger_redacted::redacted_debug!(redactor, raw, "Webhook received");
/// ```
pub const REDACTED_MARKER: &str = "[REDACTED]";
