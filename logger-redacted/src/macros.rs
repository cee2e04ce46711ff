// Logging macros that run a raw payload through a redactor first

#[macro_export]
macro_rules! redacted_debug {
    ($redactor:expr, $raw:expr, $($arg:tt)*) => {
        tracing::debug!(payload = %$redactor.redact_payload($raw), $($arg)*)
    };
}

#[macro_export]
macro_rules! redacted_error {
    ($redactor:expr, $raw:expr, $($arg:tt)*) => {
        tracing::error!(payload = %$redactor.redact_payload($raw), $($arg)*)
    };
}
