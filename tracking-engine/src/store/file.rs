use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreResult, StoredRow, Table, TableStore, Workbook};

/// Workbook persisted to a single JSON file.
///
/// The whole workbook is kept in memory and rewritten after every mutation,
/// via a temp file and a rename so a crash never leaves a half-written file.
#[derive(Debug)]
pub struct JsonFileTableStore {
    path: PathBuf,
    workbook: RwLock<Workbook>,
}

impl JsonFileTableStore {
    /// Open the workbook at `path`, starting empty when the file is absent
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let workbook = if fs::try_exists(&path).await? {
            let bytes = fs::read(&path).await?;
            serde_json::from_slice(&bytes)?
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await?;
                }
            }
            Workbook::new()
        };

        tracing::info!(path = %path.display(), "Opened workbook file");

        Ok(Self {
            path,
            workbook: RwLock::new(workbook),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, workbook: &Workbook) -> StoreResult<()> {
        let data = serde_json::to_vec_pretty(workbook)?;
        let tmp_path = self.path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl TableStore for JsonFileTableStore {
    async fn ensure_table(&self, table: &str, headers: &[String]) -> StoreResult<()> {
        let mut workbook = self.workbook.write().await;
        if workbook.ensure_table(table, headers) {
            tracing::debug!(table = table, "Created table");
            self.persist(&workbook).await?;
        }
        Ok(())
    }

    async fn append_row(&self, table: &str, cells: Vec<Value>) -> StoreResult<Uuid> {
        let mut workbook = self.workbook.write().await;
        let id = workbook.append_row(table, cells)?;
        self.persist(&workbook).await?;
        Ok(id)
    }

    async fn find_rows(&self, table: &str, column: usize, key: &str) -> StoreResult<Vec<StoredRow>> {
        Ok(self.workbook.read().await.find_rows(table, column, key))
    }

    async fn update_row(&self, table: &str, row_id: Uuid, cells: Vec<Value>) -> StoreResult<()> {
        let mut workbook = self.workbook.write().await;
        workbook.update_row(table, row_id, cells)?;
        self.persist(&workbook).await
    }

    async fn delete_row(&self, table: &str, row_id: Uuid) -> StoreResult<bool> {
        let mut workbook = self.workbook.write().await;
        let deleted = workbook.delete_row(table, row_id);
        if deleted {
            self.persist(&workbook).await?;
        }
        Ok(deleted)
    }

    async fn read_table(&self, table: &str) -> StoreResult<Option<Table>> {
        Ok(self.workbook.read().await.table(table).cloned())
    }

    async fn table_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.workbook.read().await.table_names())
    }
}
