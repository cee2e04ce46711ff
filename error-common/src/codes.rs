// Error codes written into the error-sink tables.
// Codes are stable strings; dashboards filter on them.

pub mod validation {
    pub const MALFORMED_JSON: &str = "VALIDATION_1001";
    pub const MISSING_REQUIRED_FIELD: &str = "VALIDATION_1002";
    pub const UNKNOWN_CATEGORY: &str = "VALIDATION_1004";
}

pub mod storage {
    pub const TABLE_READ_FAILED: &str = "STORE_4001";
    pub const TABLE_WRITE_FAILED: &str = "STORE_4002";
    pub const ROW_NOT_FOUND: &str = "STORE_4003";
    pub const BACKEND_UNAVAILABLE: &str = "STORE_4004";
}

pub mod reconciliation {
    pub const TIMESTAMP_COMPARISON_FAILED: &str = "RECONCILE_5001";
}

pub mod hooks {
    pub const DISPATCH_FAILED: &str = "HOOK_6001";
}

pub mod system {
    pub const CONFIGURATION: &str = "SYSTEM_9001";
    pub const SERVER: &str = "SYSTEM_9002";
    pub const NETWORK: &str = "SYSTEM_9003";
}
