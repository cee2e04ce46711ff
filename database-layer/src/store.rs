use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use tracking_engine::{StoreError, StoreResult, StoredRow, Table, TableStore};
use uuid::Uuid;

use crate::connection::DatabasePool;
use crate::error::{DatabaseError, DatabaseResult};
use crate::schema;

/// Table store over PostgreSQL.
///
/// Every logical table is a row in `tracker_tables`; its data rows live in
/// `tracker_rows` as JSONB cell arrays ordered by insertion position.
#[derive(Clone)]
pub struct PgTableStore {
    db: DatabasePool,
}

impl PgTableStore {
    pub async fn connect(connection_string: &str, max_connections: u32) -> DatabaseResult<Self> {
        let db = DatabasePool::new(connection_string, max_connections).await?;
        Self::with_pool(db).await
    }

    pub async fn with_pool(db: DatabasePool) -> DatabaseResult<Self> {
        schema::ensure_schema(db.pool()).await?;
        Ok(Self { db })
    }

    pub fn database(&self) -> &DatabasePool {
        &self.db
    }

    async fn rows_of(&self, table: &str) -> DatabaseResult<Vec<StoredRow>> {
        let rows: Vec<(Uuid, Json<Vec<Value>>)> = sqlx::query_as(
            "SELECT id, cells FROM tracker_rows WHERE table_name = $1 ORDER BY position",
        )
        .bind(table)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(cells))| StoredRow { id, cells })
            .collect())
    }
}

fn column_index(column: usize) -> StoreResult<i32> {
    i32::try_from(column)
        .map_err(|_| StoreError::Backend(format!("column index {} out of range", column)))
}

#[async_trait]
impl TableStore for PgTableStore {
    async fn ensure_table(&self, table: &str, headers: &[String]) -> StoreResult<()> {
        let created = sqlx::query(
            "INSERT INTO tracker_tables (name, headers) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
        )
        .bind(table)
        .bind(Json(headers))
        .execute(self.db.pool())
        .await
        .map_err(DatabaseError::from)?
        .rows_affected();

        if created > 0 {
            tracing::debug!(table = table, "Created table");
        }
        Ok(())
    }

    async fn append_row(&self, table: &str, cells: Vec<Value>) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        let inserted = sqlx::query(
            "INSERT INTO tracker_rows (id, table_name, cells) \
             SELECT $1, name, $3 FROM tracker_tables WHERE name = $2",
        )
        .bind(id)
        .bind(table)
        .bind(Json(cells))
        .execute(self.db.pool())
        .await
        .map_err(DatabaseError::from)?
        .rows_affected();

        if inserted == 0 {
            return Err(StoreError::TableNotFound(table.to_string()));
        }
        Ok(id)
    }

    async fn find_rows(&self, table: &str, column: usize, key: &str) -> StoreResult<Vec<StoredRow>> {
        // ->> renders numbers and bools as text, matching key comparison elsewhere
        let rows: Vec<(Uuid, Json<Vec<Value>>)> = sqlx::query_as(
            "SELECT id, cells FROM tracker_rows \
             WHERE table_name = $1 AND cells ->> $2 = $3 ORDER BY position",
        )
        .bind(table)
        .bind(column_index(column)?)
        .bind(key)
        .fetch_all(self.db.pool())
        .await
        .map_err(DatabaseError::from)?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(cells))| StoredRow { id, cells })
            .collect())
    }

    async fn update_row(&self, table: &str, row_id: Uuid, cells: Vec<Value>) -> StoreResult<()> {
        let updated = sqlx::query("UPDATE tracker_rows SET cells = $3 WHERE table_name = $1 AND id = $2")
            .bind(table)
            .bind(row_id)
            .bind(Json(cells))
            .execute(self.db.pool())
            .await
            .map_err(DatabaseError::from)?
            .rows_affected();

        if updated == 0 {
            return Err(StoreError::RowNotFound {
                table: table.to_string(),
                row_id,
            });
        }
        Ok(())
    }

    async fn delete_row(&self, table: &str, row_id: Uuid) -> StoreResult<bool> {
        let deleted = sqlx::query("DELETE FROM tracker_rows WHERE table_name = $1 AND id = $2")
            .bind(table)
            .bind(row_id)
            .execute(self.db.pool())
            .await
            .map_err(DatabaseError::from)?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn read_table(&self, table: &str) -> StoreResult<Option<Table>> {
        let headers: Option<(Json<Vec<String>>,)> =
            sqlx::query_as("SELECT headers FROM tracker_tables WHERE name = $1")
                .bind(table)
                .fetch_optional(self.db.pool())
                .await
                .map_err(DatabaseError::from)?;

        let Some((Json(headers),)) = headers else {
            return Ok(None);
        };

        Ok(Some(Table {
            name: table.to_string(),
            headers,
            rows: self.rows_of(table).await?,
        }))
    }

    async fn table_names(&self) -> StoreResult<Vec<String>> {
        let names: Vec<(String,)> = sqlx::query_as("SELECT name FROM tracker_tables ORDER BY name")
            .fetch_all(self.db.pool())
            .await
            .map_err(DatabaseError::from)?;
        Ok(names.into_iter().map(|(name,)| name).collect())
    }
}
