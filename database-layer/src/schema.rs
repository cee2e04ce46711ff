// Schema for the generic table store
use crate::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;

const STATEMENTS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS tracker_tables (
        name TEXT PRIMARY KEY,
        headers JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS tracker_rows (
        id UUID PRIMARY KEY,
        table_name TEXT NOT NULL REFERENCES tracker_tables (name) ON DELETE CASCADE,
        position BIGSERIAL NOT NULL,
        cells JSONB NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS tracker_rows_table_position_idx ON tracker_rows (table_name, position)",
];

/// Create the store tables if missing. Safe to run on every start.
pub async fn ensure_schema(pool: &PgPool) -> DatabaseResult<()> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
    }
    tracing::debug!("Table store schema ready");
    Ok(())
}
