//! Row-oriented table storage
//!
//! A table is a named, ordered list of rows under a header row, the same
//! shape as a spreadsheet tab. Every row gets a stable UUID when it is
//! appended so that a pending delete or update keeps pointing at the right
//! row while other rows in the same table come and go.
//!
//! Backends:
//! - [`InMemoryTableStore`] for development and tests
//! - [`JsonFileTableStore`] persisting the whole workbook to one JSON file
//! - `database_layer::PgTableStore` for PostgreSQL

mod file;
mod memory;
mod workbook;

pub use file::JsonFileTableStore;
pub use memory::InMemoryTableStore;
pub use workbook::Workbook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Row {row_id} not found in table {table}")]
    RowNotFound { table: String, row_id: Uuid },

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One data row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRow {
    pub id: Uuid,
    pub cells: Vec<Value>,
}

impl StoredRow {
    pub fn new(cells: Vec<Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            cells,
        }
    }

    /// Cell at `column`, `Null` past the end of the row
    pub fn cell(&self, column: usize) -> &Value {
        self.cells.get(column).unwrap_or(&Value::Null)
    }
}

/// A table with its header row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<StoredRow>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }
}

/// Text form of a cell for key matching.
///
/// Keys sometimes arrive as numbers (`"id": 9876`) and sometimes as strings,
/// so both sides are compared as strings.
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Create the table with `headers` if it does not exist yet
    async fn ensure_table(&self, table: &str, headers: &[String]) -> StoreResult<()>;

    /// Append a row, returning its id. The table must exist.
    async fn append_row(&self, table: &str, cells: Vec<Value>) -> StoreResult<Uuid>;

    /// Rows whose cell at `column` equals `key`. A missing table has no rows.
    async fn find_rows(&self, table: &str, column: usize, key: &str) -> StoreResult<Vec<StoredRow>>;

    /// Replace the cells of one row in place
    async fn update_row(&self, table: &str, row_id: Uuid, cells: Vec<Value>) -> StoreResult<()>;

    /// Delete one row; `false` when it was already gone
    async fn delete_row(&self, table: &str, row_id: Uuid) -> StoreResult<bool>;

    async fn read_table(&self, table: &str) -> StoreResult<Option<Table>>;

    async fn table_names(&self) -> StoreResult<Vec<String>>;
}
