use serde::Serialize;

/// Layout of one latest-state category.
///
/// The same reconciliation routine serves every category; only the table
/// names and the positions of the key and timestamp columns differ.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerProfile {
    /// Lock scope and log label
    pub name: String,
    pub history_table: String,
    pub history_headers: Vec<String>,
    /// Every bucket table scanned for an existing record
    pub bucket_tables: Vec<String>,
    pub bucket_headers: Vec<String>,
    /// Business key position in bucket rows
    pub key_column: usize,
    /// Last-updated position in bucket rows
    pub timestamp_column: usize,
}

impl TrackerProfile {
    pub fn is_bucket(&self, table: &str) -> bool {
        self.bucket_tables.iter().any(|t| t == table)
    }
}

pub(crate) fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}
