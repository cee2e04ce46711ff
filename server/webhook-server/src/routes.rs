use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{health, tables, webhooks},
    server::TrackerServer,
};

/// Create health check routes
pub fn health_routes() -> Router<TrackerServer> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/version", get(health::version_info))
}

/// Create webhook intake routes
pub fn webhook_routes() -> Router<TrackerServer> {
    Router::new()
        .route("/orders", post(webhooks::order_webhook))
        .route("/subscriptions", post(webhooks::subscription_webhook))
        .route(
            "/page-tracker",
            get(webhooks::page_tracker_liveness).post(webhooks::page_tracker_webhook),
        )
        .route("/log/:category", post(webhooks::append_only_webhook))
}

/// Create read-only table views and error replay
pub fn admin_routes() -> Router<TrackerServer> {
    Router::new()
        .route("/tables", get(tables::list_tables))
        .route("/tables/:name", get(tables::get_table))
        .route(
            "/admin/errors/:category/replay",
            post(webhooks::replay_errors),
        )
}

/// Create all application routes
pub fn create_routes() -> Router<TrackerServer> {
    Router::new()
        .merge(health_routes())
        .nest("/webhooks", webhook_routes())
        .merge(admin_routes())
}
