//! Latest-state reconciliation
//!
//! Every event is appended to the category's history table. The bucket
//! tables are then scanned for a current-state record with the same key:
//!
//! - strictly newer incoming event: the stored record is deleted
//! - equal or older incoming event, or no readable stored time: the stored
//!   record stays and the event is not placed in any bucket
//! - a stored time that cannot be compared at all: the stored record is
//!   deleted so the newest write wins
//! - an incoming event whose own time could not be read: stored records
//!   stay and the event reaches history only
//!
//! If nothing blocked it and the event's status maps to a bucket, a fresh
//! record is inserted there. Moves between buckets are always a full delete
//! plus a full insert.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use error_common::codes;

use crate::event::Event;
use crate::locks::KeyLocks;
use crate::profile::TrackerProfile;
use crate::store::{StoreResult, StoredRow, TableStore};
use crate::timestamp::{supersedes, Supersession};

/// Bucket and history access for one profile
#[derive(Clone)]
pub struct TrackerStore {
    store: Arc<dyn TableStore>,
    profile: Arc<TrackerProfile>,
}

impl TrackerStore {
    pub fn new(store: Arc<dyn TableStore>, profile: TrackerProfile) -> Self {
        Self {
            store,
            profile: Arc::new(profile),
        }
    }

    pub fn profile(&self) -> &TrackerProfile {
        &self.profile
    }

    pub async fn find_by_key(&self, bucket: &str, key: &str) -> StoreResult<Vec<StoredRow>> {
        self.store
            .find_rows(bucket, self.profile.key_column, key)
            .await
    }

    pub async fn delete(&self, bucket: &str, row_id: Uuid) -> StoreResult<bool> {
        self.store.delete_row(bucket, row_id).await
    }

    pub async fn insert(&self, bucket: &str, record: Vec<Value>) -> StoreResult<Uuid> {
        self.store
            .ensure_table(bucket, &self.profile.bucket_headers)
            .await?;
        self.store.append_row(bucket, record).await
    }

    pub async fn append_history(&self, history: Vec<Value>) -> StoreResult<Uuid> {
        self.store
            .ensure_table(&self.profile.history_table, &self.profile.history_headers)
            .await?;
        self.store
            .append_row(&self.profile.history_table, history)
            .await
    }
}

/// What reconciliation did with one event
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub removed_from: Vec<String>,
    /// Buckets whose existing record was kept as authoritative
    pub kept_in: Vec<String>,
    pub inserted_into: Option<String>,
}

impl Reconciliation {
    pub fn placed(&self) -> bool {
        self.inserted_into.is_some()
    }
}

pub struct Reconciler {
    tracker: TrackerStore,
    locks: Arc<KeyLocks>,
}

impl Reconciler {
    pub fn new(tracker: TrackerStore, locks: Arc<KeyLocks>) -> Self {
        Self { tracker, locks }
    }

    pub fn profile(&self) -> &TrackerProfile {
        self.tracker.profile()
    }

    pub async fn apply(&self, event: Event) -> StoreResult<Reconciliation> {
        let profile = self.tracker.profile();
        let guard = self.locks.lock(&profile.name, &event.key).await;

        let result = self.apply_locked(event).await;

        drop(guard);
        self.locks.prune_idle();
        result
    }

    async fn apply_locked(&self, event: Event) -> StoreResult<Reconciliation> {
        let profile = self.tracker.profile();
        let Event {
            key,
            status,
            updated_at,
            bucket,
            record,
            history,
        } = event;

        self.tracker.append_history(history).await?;

        let mut outcome = Reconciliation::default();
        for table in &profile.bucket_tables {
            for row in self.tracker.find_by_key(table, &key).await? {
                let verdict = match updated_at {
                    Some(incoming) => supersedes(row.cell(profile.timestamp_column), incoming),
                    None => Supersession::Keep,
                };
                match verdict {
                    Supersession::Replace => {
                        tracing::debug!(
                            profile = %profile.name,
                            key = %key,
                            bucket = %table,
                            "Removing superseded record"
                        );
                        self.tracker.delete(table, row.id).await?;
                        outcome.removed_from.push(table.clone());
                    }
                    Supersession::ReplaceFailOpen => {
                        tracing::warn!(
                            profile = %profile.name,
                            key = %key,
                            bucket = %table,
                            stored = %row.cell(profile.timestamp_column),
                            code = codes::reconciliation::TIMESTAMP_COMPARISON_FAILED,
                            "Timestamp comparison failed, removing stored record"
                        );
                        self.tracker.delete(table, row.id).await?;
                        outcome.removed_from.push(table.clone());
                    }
                    Supersession::Keep => {
                        tracing::debug!(
                            profile = %profile.name,
                            key = %key,
                            bucket = %table,
                            "Existing record is as recent or newer, keeping it"
                        );
                        outcome.kept_in.push(table.clone());
                    }
                }
            }
        }

        match bucket {
            Some(target) if updated_at.is_none() => {
                tracing::warn!(
                    profile = %profile.name,
                    key = %key,
                    status = %status,
                    bucket = %target,
                    "Event time is unreadable, history only"
                );
            }
            Some(target) if outcome.kept_in.is_empty() => {
                self.tracker.insert(&target, record).await?;
                tracing::info!(
                    profile = %profile.name,
                    key = %key,
                    status = %status,
                    bucket = %target,
                    "Placed current-state record"
                );
                outcome.inserted_into = Some(target);
            }
            Some(target) => {
                tracing::info!(
                    profile = %profile.name,
                    key = %key,
                    status = %status,
                    bucket = %target,
                    kept_in = ?outcome.kept_in,
                    "Stale event, not placed"
                );
            }
            None => {
                tracing::debug!(
                    profile = %profile.name,
                    key = %key,
                    status = %status,
                    "Status is not tracked, history only"
                );
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::headers;
    use crate::store::{InMemoryTableStore, MockTableStore, StoreError};
    use crate::timestamp::timestamp_cell;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;
    use serde_json::json;

    const BUCKETS: &[&str] = &["pending", "active", "cancelled"];

    fn profile() -> TrackerProfile {
        TrackerProfile {
            name: "test".to_string(),
            history_table: "history".to_string(),
            history_headers: headers(&["Key", "Status", "Last Updated"]),
            bucket_tables: headers(BUCKETS),
            bucket_headers: headers(&["Key", "Status", "Last Updated"]),
            key_column: 0,
            timestamp_column: 2,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn event(key: &str, status: &str, secs: i64) -> Event {
        let ts = at(secs);
        let cells = vec![json!(key), json!(status), timestamp_cell(ts)];
        Event {
            key: key.to_string(),
            status: status.to_string(),
            updated_at: Some(ts),
            bucket: BUCKETS.contains(&status).then(|| status.to_string()),
            record: cells.clone(),
            history: cells,
        }
    }

    fn reconciler(store: Arc<dyn TableStore>) -> Reconciler {
        Reconciler::new(
            TrackerStore::new(store, profile()),
            Arc::new(KeyLocks::new()),
        )
    }

    async fn keys_in(store: &InMemoryTableStore, table: &str) -> Vec<String> {
        store
            .read_table(table)
            .await
            .unwrap()
            .map(|t| {
                t.rows
                    .iter()
                    .filter_map(|r| r.cell(0).as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn history_len(store: &InMemoryTableStore) -> usize {
        store
            .read_table("history")
            .await
            .unwrap()
            .map_or(0, |t| t.rows.len())
    }

    #[tokio::test]
    async fn test_stale_event_is_dropped_from_buckets() {
        let store = Arc::new(InMemoryTableStore::new());
        let reconciler = reconciler(store.clone());

        reconciler.apply(event("K1", "pending", 100)).await.unwrap();
        let outcome = reconciler.apply(event("K1", "active", 50)).await.unwrap();

        assert_eq!(outcome.kept_in, vec!["pending"]);
        assert!(!outcome.placed());
        assert_eq!(keys_in(&store, "pending").await, vec!["K1"]);
        assert!(keys_in(&store, "active").await.is_empty());
        assert_eq!(history_len(&store).await, 2);
    }

    #[tokio::test]
    async fn test_newer_event_moves_between_buckets() {
        let store = Arc::new(InMemoryTableStore::new());
        let reconciler = reconciler(store.clone());

        reconciler.apply(event("K1", "pending", 100)).await.unwrap();
        let outcome = reconciler.apply(event("K1", "active", 200)).await.unwrap();

        assert_eq!(outcome.removed_from, vec!["pending"]);
        assert_eq!(outcome.inserted_into.as_deref(), Some("active"));
        assert!(keys_in(&store, "pending").await.is_empty());
        assert_eq!(keys_in(&store, "active").await, vec!["K1"]);
        assert_eq!(history_len(&store).await, 2);
    }

    #[tokio::test]
    async fn test_equal_timestamp_keeps_existing() {
        let store = Arc::new(InMemoryTableStore::new());
        let reconciler = reconciler(store.clone());

        reconciler.apply(event("K1", "pending", 100)).await.unwrap();
        reconciler.apply(event("K1", "active", 100)).await.unwrap();

        assert_eq!(keys_in(&store, "pending").await, vec!["K1"]);
        assert!(keys_in(&store, "active").await.is_empty());
    }

    #[tokio::test]
    async fn test_untracked_status_only_reaches_history() {
        let store = Arc::new(InMemoryTableStore::new());
        let reconciler = reconciler(store.clone());

        reconciler.apply(event("K1", "pending", 100)).await.unwrap();
        let outcome = reconciler.apply(event("K1", "shipped", 200)).await.unwrap();

        assert_eq!(outcome.removed_from, vec!["pending"]);
        assert!(!outcome.placed());
        for bucket in BUCKETS {
            assert!(keys_in(&store, bucket).await.is_empty());
        }
        assert_eq!(history_len(&store).await, 2);
    }

    #[tokio::test]
    async fn test_incomparable_stored_time_fails_open() {
        let store = Arc::new(InMemoryTableStore::new());
        store
            .ensure_table("pending", &profile().bucket_headers)
            .await
            .unwrap();
        store
            .append_row("pending", vec![json!("K1"), json!("pending"), json!(true)])
            .await
            .unwrap();

        let outcome = reconciler(store.clone())
            .apply(event("K1", "active", 10))
            .await
            .unwrap();

        assert_eq!(outcome.removed_from, vec!["pending"]);
        assert_eq!(keys_in(&store, "active").await, vec!["K1"]);
    }

    #[tokio::test]
    async fn test_unparseable_stored_time_is_kept() {
        let store = Arc::new(InMemoryTableStore::new());
        store
            .ensure_table("pending", &profile().bucket_headers)
            .await
            .unwrap();
        store
            .append_row("pending", vec![json!("K1"), json!("pending"), json!("soon")])
            .await
            .unwrap();

        let outcome = reconciler(store.clone())
            .apply(event("K1", "active", 10))
            .await
            .unwrap();

        assert_eq!(outcome.kept_in, vec!["pending"]);
        assert!(keys_in(&store, "active").await.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_event_time_keeps_stored_record() {
        let store = Arc::new(InMemoryTableStore::new());
        let reconciler = reconciler(store.clone());
        reconciler.apply(event("K1", "pending", 100)).await.unwrap();

        let mut unreadable = event("K1", "active", 0);
        unreadable.updated_at = None;
        let outcome = reconciler.apply(unreadable).await.unwrap();

        assert_eq!(outcome.kept_in, vec!["pending"]);
        assert!(outcome.removed_from.is_empty());
        assert!(!outcome.placed());
        assert_eq!(keys_in(&store, "pending").await, vec!["K1"]);
        assert!(keys_in(&store, "active").await.is_empty());
        assert_eq!(history_len(&store).await, 2);

        // nothing stored yet: still history only
        let mut first = event("K2", "active", 0);
        first.updated_at = None;
        assert!(!reconciler.apply(first).await.unwrap().placed());
        assert!(!keys_in(&store, "active").await.contains(&"K2".to_string()));
    }

    #[tokio::test]
    async fn test_history_failure_is_propagated() {
        let mut store = MockTableStore::new();
        store.expect_ensure_table().returning(|_, _| Ok(()));
        store
            .expect_append_row()
            .returning(|_, _| Err(StoreError::Backend("connection reset".into())));

        let result = reconciler(Arc::new(store))
            .apply(event("K1", "pending", 100))
            .await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn test_concurrent_events_leave_one_record() {
        let store = Arc::new(InMemoryTableStore::new());
        let reconciler = Arc::new(reconciler(store.clone()));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let reconciler = Arc::clone(&reconciler);
                let status = BUCKETS[i % BUCKETS.len()];
                tokio::spawn(async move {
                    reconciler
                        .apply(event("K1", status, 100 + i as i64))
                        .await
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let mut placements = 0;
        for bucket in BUCKETS {
            placements += keys_in(&store, bucket).await.len();
        }
        assert_eq!(placements, 1);
        assert_eq!(history_len(&store).await, 16);
    }

    proptest! {
        #[test]
        fn prop_latest_event_owns_the_key(
            events in prop::collection::vec((0..BUCKETS.len(), 0i64..20), 1..24)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();

            runtime.block_on(async {
                let store = Arc::new(InMemoryTableStore::new());
                let reconciler = reconciler(store.clone());

                for (status, secs) in &events {
                    reconciler
                        .apply(event("K", BUCKETS[*status], *secs))
                        .await
                        .unwrap();
                }

                // Earliest-processed event among those with the greatest timestamp
                let max_secs = events.iter().map(|(_, s)| *s).max().unwrap();
                let (winner, _) = events.iter().find(|(_, s)| *s == max_secs).unwrap();

                let mut holders = Vec::new();
                for bucket in BUCKETS {
                    if !keys_in(&store, bucket).await.is_empty() {
                        holders.push(*bucket);
                    }
                }
                prop_assert_eq!(holders, vec![BUCKETS[*winner]]);
                prop_assert_eq!(history_len(&store).await, events.len());
                Ok(())
            })?;
        }
    }
}
