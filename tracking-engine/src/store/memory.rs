use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreResult, StoredRow, Table, TableStore, Workbook};

/// In-memory table store for development/testing
#[derive(Debug, Clone, Default)]
pub struct InMemoryTableStore {
    workbook: Arc<RwLock<Workbook>>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TableStore for InMemoryTableStore {
    async fn ensure_table(&self, table: &str, headers: &[String]) -> StoreResult<()> {
        if self.workbook.write().await.ensure_table(table, headers) {
            tracing::debug!(table = table, "Created table");
        }
        Ok(())
    }

    async fn append_row(&self, table: &str, cells: Vec<Value>) -> StoreResult<Uuid> {
        self.workbook.write().await.append_row(table, cells)
    }

    async fn find_rows(&self, table: &str, column: usize, key: &str) -> StoreResult<Vec<StoredRow>> {
        Ok(self.workbook.read().await.find_rows(table, column, key))
    }

    async fn update_row(&self, table: &str, row_id: Uuid, cells: Vec<Value>) -> StoreResult<()> {
        self.workbook.write().await.update_row(table, row_id, cells)
    }

    async fn delete_row(&self, table: &str, row_id: Uuid) -> StoreResult<bool> {
        Ok(self.workbook.write().await.delete_row(table, row_id))
    }

    async fn read_table(&self, table: &str) -> StoreResult<Option<Table>> {
        Ok(self.workbook.read().await.table(table).cloned())
    }

    async fn table_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.workbook.read().await.table_names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_in_memory_store_round_trip() {
        let store = InMemoryTableStore::new();
        store
            .ensure_table("full_log", &["Order #".to_string()])
            .await
            .unwrap();
        let id = store.append_row("full_log", vec![json!("1001")]).await.unwrap();

        let rows = store.find_rows("full_log", 0, "1001").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);

        assert!(store.delete_row("full_log", id).await.unwrap());
        let table = store.read_table("full_log").await.unwrap().unwrap();
        assert!(table.rows.is_empty());
        assert_eq!(store.table_names().await.unwrap(), vec!["full_log"]);
    }
}
