//! Latest-state tracking for CarePortals and Embeddables webhooks
//!
//! Every inbound event is appended to an immutable history table. For
//! orders and subscriptions the engine also keeps exactly one current-state
//! row per business key across the category's bucket tables, replacing it
//! only when a strictly newer event arrives. Form-fill progress keeps one
//! row per entry holding the furthest page reached.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use config_engine::AppConfig;
//! use tracking_engine::{HookDispatcher, Ingestor, InMemoryTableStore, LoggingHook};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (hooks, _worker) = HookDispatcher::spawn(vec![Arc::new(LoggingHook)]);
//! let ingestor = Ingestor::new(Arc::new(InMemoryTableStore::new()), AppConfig::default(), hooks);
//!
//! let response = ingestor
//!     .ingest_order(r#"{"id": 1001, "status": "pending", "updatedAt": "2024-07-25T10:05:00Z"}"#)
//!     .await;
//! assert!(response.success);
//! # }
//! ```

pub mod categories;
pub mod error;
pub mod event;
pub mod hooks;
pub mod locks;
pub mod pipeline;
pub mod profile;
pub mod progress;
pub mod response;
pub mod sink;
pub mod store;
pub mod timestamp;
pub mod tracker;

pub use error::{TrackingError, TrackingResult};
pub use event::Event;
pub use hooks::{CommitOutcome, HookDispatcher, HookError, LoggingHook, PostCommitHook};
pub use locks::KeyLocks;
pub use pipeline::{Category, Ingestor, ReplayFailure, ReplaySummary};
pub use profile::TrackerProfile;
pub use progress::{PageProgressTracker, ProgressAction, ProgressOutcome};
pub use response::IngestResponse;
pub use sink::{ErrorRecord, ErrorSink};
pub use store::{
    InMemoryTableStore, JsonFileTableStore, StoreError, StoreResult, StoredRow, Table, TableStore,
};
pub use tracker::{Reconciler, Reconciliation, TrackerStore};
