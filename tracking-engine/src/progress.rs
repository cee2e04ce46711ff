//! Furthest-progress tracking for multi-page forms.
//!
//! One tracker row per entry is upserted in place on every submission. The
//! furthest page only moves when a submission's page index is strictly
//! greater than the stored one; only those forward moves are appended to
//! the progress log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::categories::page::{
    self, PageSubmission, FIRST_STARTED_COLUMN, FURTHEST_INDEX_COLUMN, FURTHEST_REACHED_COLUMN,
    LOG_HEADERS, TRACKER_HEADERS,
};
use crate::locks::KeyLocks;
use crate::profile::headers;
use crate::store::{StoreResult, TableStore};
use crate::timestamp::timestamp_cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressAction {
    Created,
    Updated,
}

impl ProgressAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressAction::Created => "created",
            ProgressAction::Updated => "updated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOutcome {
    pub action: ProgressAction,
    pub logged_forward: bool,
    pub furthest_index: i64,
}

pub struct PageProgressTracker {
    store: Arc<dyn TableStore>,
    tracker_table: String,
    log_table: String,
    locks: Arc<KeyLocks>,
}

impl PageProgressTracker {
    pub fn new(
        store: Arc<dyn TableStore>,
        tracker_table: impl Into<String>,
        log_table: impl Into<String>,
        locks: Arc<KeyLocks>,
    ) -> Self {
        Self {
            store,
            tracker_table: tracker_table.into(),
            log_table: log_table.into(),
            locks,
        }
    }

    pub async fn record(
        &self,
        submission: &PageSubmission,
        now: DateTime<Utc>,
    ) -> StoreResult<ProgressOutcome> {
        let guard = self.locks.lock(page::CATEGORY, &submission.entry_id).await;
        let result = self.record_locked(submission, now).await;
        drop(guard);
        self.locks.prune_idle();
        result
    }

    async fn record_locked(
        &self,
        submission: &PageSubmission,
        now: DateTime<Utc>,
    ) -> StoreResult<ProgressOutcome> {
        self.store
            .ensure_table(&self.tracker_table, &headers(TRACKER_HEADERS))
            .await?;
        self.store
            .ensure_table(&self.log_table, &headers(LOG_HEADERS))
            .await?;

        let existing = self
            .store
            .find_rows(&self.tracker_table, page::ENTRY_ID_COLUMN, &submission.entry_id)
            .await?
            .into_iter()
            .next();

        // A brand-new entry has furthest index -1 so page 0 counts as progress
        let stored_index = existing
            .as_ref()
            .map_or(-1, |row| page::page_index(Some(row.cell(FURTHEST_INDEX_COLUMN))));
        let forward = submission.page_index > stored_index;

        let (first_started, stored_reached) = match &existing {
            Some(row) => (
                row.cell(FIRST_STARTED_COLUMN).clone(),
                row.cell(FURTHEST_REACHED_COLUMN).clone(),
            ),
            None => (timestamp_cell(now), Value::String(String::new())),
        };

        let (furthest_reached, furthest_index) = if forward {
            (
                Value::String(submission.current_page_key.clone().unwrap_or_default()),
                submission.page_index,
            )
        } else {
            (stored_reached, stored_index)
        };

        let row = submission.tracker_row(first_started, now, furthest_reached, furthest_index);
        let action = match &existing {
            Some(existing) => {
                self.store
                    .update_row(&self.tracker_table, existing.id, row)
                    .await?;
                ProgressAction::Updated
            }
            None => {
                self.store.append_row(&self.tracker_table, row).await?;
                ProgressAction::Created
            }
        };

        if forward {
            self.store
                .append_row(&self.log_table, submission.log_row(now))
                .await?;
        }

        tracing::info!(
            entry_id = %submission.entry_id,
            page_index = submission.page_index,
            furthest_index = furthest_index,
            action = action.as_str(),
            logged_forward = forward,
            "Page progress recorded"
        );

        Ok(ProgressOutcome {
            action,
            logged_forward: forward,
            furthest_index,
        })
    }
}
