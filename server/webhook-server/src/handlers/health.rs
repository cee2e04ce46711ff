use axum::{extract::State, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use tracking_engine::categories::{orders, page, subscriptions};

use crate::server::TrackerServer;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime: u64,
    pub checks: BTreeMap<String, String>,
}

/// Version information response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
    pub storage_backend: String,
    pub categories: Vec<String>,
}

/// Health check handler. Storage is checked by listing its tables.
pub async fn health_check(State(server): State<TrackerServer>) -> Json<HealthResponse> {
    let mut checks = BTreeMap::new();

    let storage_ok = match server.ingestor.store().table_names().await {
        Ok(_) => {
            checks.insert("storage".to_string(), "healthy".to_string());
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "Storage health check failed");
            checks.insert("storage".to_string(), format!("unhealthy: {}", e));
            false
        }
    };

    Json(HealthResponse {
        status: if storage_ok { "healthy" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: server.uptime_seconds(),
        checks,
    })
}

/// Version information handler
pub async fn version_info(State(server): State<TrackerServer>) -> Json<VersionResponse> {
    let settings = server.ingestor.settings();
    let mut categories: Vec<String> = [orders::CATEGORY, subscriptions::CATEGORY, page::CATEGORY]
        .iter()
        .map(|c| (*c).to_string())
        .collect();
    categories.extend(settings.append_only.categories.keys().cloned());

    Json(VersionResponse {
        name: server.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage_backend: server.backend.to_string(),
        categories,
    })
}
