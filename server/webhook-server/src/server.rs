use config_engine::{AppConfig, StorageBackendKind};
use database_layer::PgTableStore;
use error_common::{Result, WebhookError};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracking_engine::{
    HookDispatcher, Ingestor, InMemoryTableStore, JsonFileTableStore, LoggingHook, TableStore,
};

/// Shared server state
#[derive(Clone)]
pub struct TrackerServer {
    /// Webhook ingestion over the configured table store
    pub ingestor: Arc<Ingestor>,
    /// Server name from configuration
    pub name: String,
    /// Label of the active storage backend
    pub backend: &'static str,
    started_at: Instant,
}

impl TrackerServer {
    /// Open the configured storage backend and start the post-commit hook
    /// worker. The returned handle finishes once every clone of the state
    /// has been dropped.
    pub async fn from_config(config: AppConfig) -> Result<(Self, JoinHandle<()>)> {
        let store = open_store(&config).await?;
        let (hooks, worker) = HookDispatcher::spawn(vec![Arc::new(LoggingHook)]);
        Ok((Self::new(store, config, hooks), worker))
    }

    pub fn new(store: Arc<dyn TableStore>, config: AppConfig, hooks: HookDispatcher) -> Self {
        let backend = backend_label(&config.storage.backend);
        let name = config.server.name.clone();
        Self {
            ingestor: Arc::new(Ingestor::new(store, config, hooks)),
            name,
            backend,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

fn backend_label(kind: &StorageBackendKind) -> &'static str {
    match kind {
        StorageBackendKind::Memory => "memory",
        StorageBackendKind::File => "file",
        StorageBackendKind::Postgres => "postgres",
    }
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn TableStore>> {
    let storage = &config.storage;
    let store: Arc<dyn TableStore> = match storage.backend {
        StorageBackendKind::Memory => Arc::new(InMemoryTableStore::new()),
        StorageBackendKind::File => Arc::new(
            JsonFileTableStore::open(&storage.path)
                .await
                .map_err(|e| WebhookError::StorageError(e.to_string()))?,
        ),
        StorageBackendKind::Postgres => {
            let url = storage.database_url.as_deref().ok_or_else(|| {
                WebhookError::ConfigError("storage.database_url is required for postgres".into())
            })?;
            Arc::new(
                PgTableStore::connect(url, storage.max_connections)
                    .await
                    .map_err(|e| WebhookError::StorageError(e.to_string()))?,
            )
        }
    };

    tracing::info!(backend = backend_label(&storage.backend), "Table store ready");
    Ok(store)
}
