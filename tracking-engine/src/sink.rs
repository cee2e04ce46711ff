use chrono::Utc;
use error_common::ErrorContext;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::TrackingError;
use crate::store::{cell_text, StoreResult, TableStore};
use crate::timestamp::timestamp_cell;

pub const ERROR_HEADERS: &[&str] = &[
    "Timestamp",
    "Error Type",
    "Error Code",
    "Error Message",
    "Raw Data",
    "Context",
];

const RAW_DATA_COLUMN: usize = 4;
const CONTEXT_COLUMN: usize = 5;

/// A stored failure whose payload can be fed back through ingestion
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub row_id: Uuid,
    pub raw: String,
    pub context: ErrorContext,
}

/// Appends ingestion failures to the category's error table.
///
/// Recording never fails from the caller's point of view: a write error is
/// logged and dropped.
#[derive(Clone)]
pub struct ErrorSink {
    store: Arc<dyn TableStore>,
}

impl ErrorSink {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        table: &str,
        error: &TrackingError,
        raw: &str,
        context: &ErrorContext,
    ) {
        if let Err(sink_error) = self.try_record(table, error, raw, context).await {
            tracing::error!(
                table = table,
                error = %sink_error,
                original_error = %error,
                "Could not write error record"
            );
        }
    }

    async fn try_record(
        &self,
        table: &str,
        error: &TrackingError,
        raw: &str,
        context: &ErrorContext,
    ) -> StoreResult<()> {
        let headers: Vec<String> = ERROR_HEADERS.iter().map(|h| (*h).to_string()).collect();
        self.store.ensure_table(table, &headers).await?;

        let row = vec![
            timestamp_cell(Utc::now()),
            Value::from(error.error_type()),
            Value::from(error.code()),
            Value::from(error.to_string()),
            Value::from(raw),
            Value::from(context.to_cell()),
        ];
        self.store.append_row(table, row).await?;

        tracing::debug!(
            table = table,
            error_type = error.error_type(),
            "Recorded error"
        );
        Ok(())
    }

    /// Non-empty payloads in `table` recorded for `category`.
    ///
    /// Rows without a category in their context are included so error
    /// tables written by hand stay replayable.
    pub async fn replayable(&self, table: &str, category: &str) -> StoreResult<Vec<ErrorRecord>> {
        let Some(snapshot) = self.store.read_table(table).await? else {
            return Ok(Vec::new());
        };

        let records = snapshot
            .rows
            .into_iter()
            .filter_map(|row| {
                let raw = cell_text(row.cell(RAW_DATA_COLUMN))?;
                if raw.trim().is_empty() {
                    return None;
                }
                let context = row
                    .cell(CONTEXT_COLUMN)
                    .as_str()
                    .and_then(|cell| serde_json::from_str::<ErrorContext>(cell).ok())
                    .unwrap_or_default();
                match context.category.as_deref() {
                    Some(recorded) if recorded != category => None,
                    _ => Some(ErrorRecord {
                        row_id: row.id,
                        raw,
                        context,
                    }),
                }
            })
            .collect();

        Ok(records)
    }
}
