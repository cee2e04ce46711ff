//! Post-commit hooks
//!
//! After a successful ingestion the outcome is queued to a background task
//! that runs every registered hook. Hooks cannot affect the webhook
//! response; their failures are only logged.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error_common::codes;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const DEFAULT_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("Hook {hook} failed: {message}")]
    Failed { hook: String, message: String },
}

/// A committed ingestion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitOutcome {
    pub category: String,
    pub key: String,
    pub status: Option<String>,
    /// Table the current-state row landed in, if any
    pub table: Option<String>,
    pub committed_at: DateTime<Utc>,
}

impl CommitOutcome {
    pub fn new(category: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            key: key.into(),
            status: None,
            table: None,
            committed_at: Utc::now(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_table(mut self, table: Option<String>) -> Self {
        self.table = table;
        self
    }
}

#[async_trait]
pub trait PostCommitHook: Send + Sync {
    fn name(&self) -> &str;

    async fn on_commit(&self, outcome: &CommitOutcome) -> Result<(), HookError>;
}

/// Logs every committed outcome
#[derive(Debug, Default)]
pub struct LoggingHook;

#[async_trait]
impl PostCommitHook for LoggingHook {
    fn name(&self) -> &str {
        "logging"
    }

    async fn on_commit(&self, outcome: &CommitOutcome) -> Result<(), HookError> {
        tracing::info!(
            category = %outcome.category,
            key = %outcome.key,
            status = ?outcome.status,
            table = ?outcome.table,
            "Ingestion committed"
        );
        Ok(())
    }
}

/// Queues outcomes to the hook worker
#[derive(Debug, Clone)]
pub struct HookDispatcher {
    sender: mpsc::Sender<CommitOutcome>,
}

impl HookDispatcher {
    /// Start the worker. Must be called inside a tokio runtime.
    pub fn spawn(hooks: Vec<Arc<dyn PostCommitHook>>) -> (Self, JoinHandle<()>) {
        Self::spawn_with_capacity(hooks, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn spawn_with_capacity(
        hooks: Vec<Arc<dyn PostCommitHook>>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<CommitOutcome>(capacity);

        let worker = tokio::spawn(async move {
            while let Some(outcome) = receiver.recv().await {
                for hook in &hooks {
                    if let Err(e) = hook.on_commit(&outcome).await {
                        tracing::warn!(
                            hook = hook.name(),
                            code = codes::hooks::DISPATCH_FAILED,
                            category = %outcome.category,
                            key = %outcome.key,
                            error = %e,
                            "Post-commit hook failed"
                        );
                    }
                }
            }
            tracing::debug!("Post-commit hook worker stopped");
        });

        (Self { sender }, worker)
    }

    /// Queue without waiting; a full or closed queue drops the outcome
    pub fn dispatch(&self, outcome: CommitOutcome) {
        if let Err(e) = self.sender.try_send(outcome) {
            tracing::warn!(error = %e, "Dropped post-commit outcome");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHook {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PostCommitHook for CountingHook {
        fn name(&self) -> &str {
            "counting"
        }

        async fn on_commit(&self, _outcome: &CommitOutcome) -> Result<(), HookError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingHook;

    #[async_trait]
    impl PostCommitHook for FailingHook {
        fn name(&self) -> &str {
            "failing"
        }

        async fn on_commit(&self, _outcome: &CommitOutcome) -> Result<(), HookError> {
            Err(HookError::Failed {
                hook: "failing".into(),
                message: "crm unreachable".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_failing_hook_does_not_stop_others() {
        let calls = Arc::new(AtomicUsize::new(0));
        let hooks: Vec<Arc<dyn PostCommitHook>> = vec![
            Arc::new(FailingHook),
            Arc::new(CountingHook {
                calls: Arc::clone(&calls),
            }),
            Arc::new(LoggingHook),
        ];

        let (dispatcher, worker) = HookDispatcher::spawn(hooks);
        dispatcher.dispatch(CommitOutcome::new("orders", "1001").with_status("pending"));
        dispatcher.dispatch(CommitOutcome::new("orders", "1002"));
        drop(dispatcher);

        worker.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
