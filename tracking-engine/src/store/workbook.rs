use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{cell_text, StoreError, StoreResult, StoredRow, Table};

/// The full set of tables held by the in-process backends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    tables: BTreeMap<String, Table>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the table was created
    pub fn ensure_table(&mut self, table: &str, headers: &[String]) -> bool {
        if self.tables.contains_key(table) {
            return false;
        }
        self.tables
            .insert(table.to_string(), Table::new(table, headers.to_vec()));
        true
    }

    pub fn append_row(&mut self, table: &str, cells: Vec<Value>) -> StoreResult<Uuid> {
        let target = self.table_mut(table)?;
        let row = StoredRow::new(cells);
        let id = row.id;
        target.rows.push(row);
        Ok(id)
    }

    pub fn find_rows(&self, table: &str, column: usize, key: &str) -> Vec<StoredRow> {
        self.tables
            .get(table)
            .map(|t| {
                t.rows
                    .iter()
                    .filter(|row| cell_text(row.cell(column)).as_deref() == Some(key))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn update_row(&mut self, table: &str, row_id: Uuid, cells: Vec<Value>) -> StoreResult<()> {
        let target = self.table_mut(table)?;
        let row = target
            .rows
            .iter_mut()
            .find(|row| row.id == row_id)
            .ok_or_else(|| StoreError::RowNotFound {
                table: table.to_string(),
                row_id,
            })?;
        row.cells = cells;
        Ok(())
    }

    pub fn delete_row(&mut self, table: &str, row_id: Uuid) -> bool {
        match self.tables.get_mut(table) {
            Some(target) => {
                let before = target.rows.len();
                target.rows.retain(|row| row.id != row_id);
                target.rows.len() != before
            }
            None => false,
        }
    }

    pub fn table(&self, table: &str) -> Option<&Table> {
        self.tables.get(table)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    fn table_mut(&mut self, table: &str) -> StoreResult<&mut Table> {
        self.tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers() -> Vec<String> {
        vec!["Order #".to_string(), "Status".to_string()]
    }

    #[test]
    fn test_numeric_and_string_keys_match() {
        let mut book = Workbook::new();
        book.ensure_table("pending", &headers());
        book.append_row("pending", vec![json!(9876), json!("pending")]).unwrap();
        book.append_row("pending", vec![json!("9877"), json!("pending")]).unwrap();

        assert_eq!(book.find_rows("pending", 0, "9876").len(), 1);
        assert_eq!(book.find_rows("pending", 0, "9877").len(), 1);
        assert!(book.find_rows("missing", 0, "9876").is_empty());
    }

    #[test]
    fn test_row_ids_survive_other_deletes() {
        let mut book = Workbook::new();
        book.ensure_table("pending", &headers());
        let first = book.append_row("pending", vec![json!("A"), json!("pending")]).unwrap();
        let second = book.append_row("pending", vec![json!("B"), json!("pending")]).unwrap();

        assert!(book.delete_row("pending", first));
        assert!(!book.delete_row("pending", first));
        book.update_row("pending", second, vec![json!("B"), json!("processing")])
            .unwrap();

        let table = book.table("pending").unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cells[1], json!("processing"));
    }

    #[test]
    fn test_append_to_missing_table_fails() {
        let mut book = Workbook::new();
        let result = book.append_row("nowhere", vec![]);
        assert!(matches!(result, Err(StoreError::TableNotFound(_))));
    }

    #[test]
    fn test_ensure_table_keeps_existing_headers() {
        let mut book = Workbook::new();
        assert!(book.ensure_table("pending", &headers()));
        assert!(!book.ensure_table("pending", &["Other".to_string()]));
        assert_eq!(book.table("pending").unwrap().headers, headers());
    }
}
