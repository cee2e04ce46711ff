//! Webhook intake
//!
//! Bodies are taken as raw bytes so that a payload which is not valid JSON
//! still reaches the ingestor and lands in the error table verbatim. Every
//! handler answers 200 with the JSON envelope.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracking_engine::{IngestResponse, ReplaySummary};

use crate::error::ApiResult;
use crate::server::TrackerServer;

pub const PAGE_TRACKER_LIVENESS: &str =
    "Page Tracker Webhook is running! Use POST to submit data.";

#[derive(Debug, Deserialize)]
pub struct TriggerQuery {
    pub trigger: Option<String>,
}

fn body_text(body: &Bytes) -> String {
    String::from_utf8_lossy(body).into_owned()
}

pub async fn order_webhook(
    State(server): State<TrackerServer>,
    body: Bytes,
) -> Json<IngestResponse> {
    Json(server.ingestor.ingest_order(&body_text(&body)).await)
}

pub async fn subscription_webhook(
    State(server): State<TrackerServer>,
    Query(query): Query<TriggerQuery>,
    body: Bytes,
) -> Json<IngestResponse> {
    Json(
        server
            .ingestor
            .ingest_subscription(&body_text(&body), query.trigger.as_deref())
            .await,
    )
}

pub async fn page_tracker_webhook(
    State(server): State<TrackerServer>,
    body: Bytes,
) -> Json<IngestResponse> {
    Json(server.ingestor.ingest_page(&body_text(&body)).await)
}

pub async fn page_tracker_liveness() -> &'static str {
    PAGE_TRACKER_LIVENESS
}

pub async fn append_only_webhook(
    State(server): State<TrackerServer>,
    Path(category): Path<String>,
    body: Bytes,
) -> Json<IngestResponse> {
    Json(
        server
            .ingestor
            .ingest_append_only(&category, &body_text(&body))
            .await,
    )
}

/// Feed a category's error table back through ingestion
pub async fn replay_errors(
    State(server): State<TrackerServer>,
    Path(category): Path<String>,
) -> ApiResult<Json<ReplaySummary>> {
    let summary = server.ingestor.replay_errors(&category).await?;
    Ok(Json(summary))
}
