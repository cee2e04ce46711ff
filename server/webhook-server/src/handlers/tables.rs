use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracking_engine::Table;

use crate::error::{ApiError, ApiResult};
use crate::server::TrackerServer;

/// One entry of the table listing
#[derive(Debug, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub columns: usize,
    pub rows: usize,
}

#[derive(Debug, Serialize)]
pub struct TablesResponse {
    pub tables: Vec<TableSummary>,
}

pub async fn list_tables(State(server): State<TrackerServer>) -> ApiResult<Json<TablesResponse>> {
    let store = server.ingestor.store();
    let mut tables = Vec::new();

    for name in store.table_names().await? {
        // a table dropped between the two calls is simply skipped
        if let Some(table) = store.read_table(&name).await? {
            tables.push(TableSummary {
                name,
                columns: table.headers.len(),
                rows: table.rows.len(),
            });
        }
    }

    Ok(Json(TablesResponse { tables }))
}

pub async fn get_table(
    State(server): State<TrackerServer>,
    Path(name): Path<String>,
) -> ApiResult<Json<Table>> {
    server
        .ingestor
        .store()
        .read_table(&name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("table {}", name)))
}
