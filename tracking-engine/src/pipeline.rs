//! Webhook ingestion
//!
//! [`Ingestor`] is the single entry point for raw webhook bodies. Each
//! category method parses the body, maps it into rows, runs reconciliation
//! or progress tracking, and hands the committed outcome to the post-commit
//! hooks. Ingestion never fails outward: any error is written to the
//! category's error table together with the raw body and turned into a
//! failure response.

use chrono::Utc;
use config_engine::AppConfig;
use error_common::ErrorContext;
use logger_redacted::{redacted_debug, redacted_error, PiiRedactor};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::categories::append_only::{AppendOnlyEntry, APPEND_HEADERS};
use crate::categories::orders::{self, OrderPayload};
use crate::categories::page::{self, PageSubmission};
use crate::categories::subscriptions::{self, SubscriptionPayload};
use crate::categories::Fields;
use crate::error::{TrackingError, TrackingResult};
use crate::hooks::{CommitOutcome, HookDispatcher};
use crate::locks::KeyLocks;
use crate::profile::headers;
use crate::progress::PageProgressTracker;
use crate::response::IngestResponse;
use crate::sink::ErrorSink;
use crate::store::TableStore;
use crate::tracker::{Reconciler, TrackerStore};

/// A webhook category as addressed by the HTTP routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    Orders,
    Subscriptions,
    PageTracker,
    /// Declared in `append_only.categories`
    AppendOnly(String),
}

impl Category {
    pub fn parse(name: &str, settings: &AppConfig) -> TrackingResult<Self> {
        match name {
            orders::CATEGORY => Ok(Category::Orders),
            subscriptions::CATEGORY => Ok(Category::Subscriptions),
            page::CATEGORY | "page-tracker" => Ok(Category::PageTracker),
            other if settings.append_only.categories.contains_key(other) => {
                Ok(Category::AppendOnly(other.to_string()))
            }
            other => Err(TrackingError::UnknownCategory(other.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Category::Orders => orders::CATEGORY,
            Category::Subscriptions => subscriptions::CATEGORY,
            Category::PageTracker => page::CATEGORY,
            Category::AppendOnly(name) => name,
        }
    }

    pub fn error_table<'a>(&self, settings: &'a AppConfig) -> &'a str {
        match self {
            Category::Orders => &settings.orders.error_table,
            Category::Subscriptions => &settings.subscriptions.error_table,
            Category::PageTracker => &settings.page_tracker.error_table,
            Category::AppendOnly(_) => &settings.append_only.error_table,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayFailure {
    pub row_id: Uuid,
    pub error: String,
}

/// Result of feeding an error table back through ingestion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
    pub category: String,
    pub error_table: String,
    pub replayed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<ReplayFailure>,
}

pub struct Ingestor {
    store: Arc<dyn TableStore>,
    settings: Arc<AppConfig>,
    orders: Reconciler,
    subscriptions: Reconciler,
    progress: PageProgressTracker,
    sink: ErrorSink,
    hooks: HookDispatcher,
    redactor: PiiRedactor,
}

impl Ingestor {
    pub fn new(store: Arc<dyn TableStore>, settings: AppConfig, hooks: HookDispatcher) -> Self {
        let locks = Arc::new(KeyLocks::new());

        let orders = Reconciler::new(
            TrackerStore::new(Arc::clone(&store), orders::profile(&settings.orders)),
            Arc::clone(&locks),
        );
        let subscriptions = Reconciler::new(
            TrackerStore::new(
                Arc::clone(&store),
                subscriptions::profile(&settings.subscriptions),
            ),
            Arc::clone(&locks),
        );
        let progress = PageProgressTracker::new(
            Arc::clone(&store),
            settings.page_tracker.tracker_table.clone(),
            settings.page_tracker.log_table.clone(),
            locks,
        );

        Self {
            sink: ErrorSink::new(Arc::clone(&store)),
            redactor: PiiRedactor::from_logger_config(&settings.logging),
            store,
            settings: Arc::new(settings),
            orders,
            subscriptions,
            progress,
            hooks,
        }
    }

    pub fn store(&self) -> Arc<dyn TableStore> {
        Arc::clone(&self.store)
    }

    pub fn settings(&self) -> &AppConfig {
        &self.settings
    }

    pub async fn ingest_order(&self, raw: &str) -> IngestResponse {
        redacted_debug!(self.redactor, raw, category = orders::CATEGORY, "Webhook received");

        match self.process_order(raw).await {
            Ok(response) => response,
            Err(e) => {
                let context = ErrorContext::new().with_category(orders::CATEGORY);
                self.fail(&Category::Orders, e, raw, context, "Failed to process order update")
                    .await
            }
        }
    }

    pub async fn ingest_subscription(&self, raw: &str, trigger: Option<&str>) -> IngestResponse {
        redacted_debug!(
            self.redactor,
            raw,
            category = subscriptions::CATEGORY,
            trigger = ?trigger,
            "Webhook received"
        );

        match self.process_subscription(raw, trigger).await {
            Ok(response) => response,
            Err(e) => {
                let trigger = trigger.unwrap_or("unknown");
                let context = ErrorContext::new()
                    .with_category(subscriptions::CATEGORY)
                    .add_context("trigger", trigger);
                self.fail(
                    &Category::Subscriptions,
                    e,
                    raw,
                    context,
                    "Failed to process subscription webhook",
                )
                .await
                .with("trigger", trigger)
            }
        }
    }

    pub async fn ingest_page(&self, raw: &str) -> IngestResponse {
        redacted_debug!(self.redactor, raw, category = page::CATEGORY, "Webhook received");

        match self.process_page(raw).await {
            Ok(response) => response,
            Err(e) => {
                let context = ErrorContext::new().with_category(page::CATEGORY);
                self.fail(
                    &Category::PageTracker,
                    e,
                    raw,
                    context,
                    "Failed to process page tracking",
                )
                .await
            }
        }
    }

    pub async fn ingest_append_only(&self, category: &str, raw: &str) -> IngestResponse {
        redacted_debug!(self.redactor, raw, category = category, "Webhook received");

        match self.process_append_only(category, raw).await {
            Ok(response) => response,
            Err(e) => {
                let context = ErrorContext::new().with_category(category);
                self.fail(
                    &Category::AppendOnly(category.to_string()),
                    e,
                    raw,
                    context,
                    "Failed to log webhook data",
                )
                .await
                .with("category", category)
            }
        }
    }

    /// Re-ingest every stored payload in the category's error table.
    ///
    /// Error rows are left in place; a payload that fails again is counted,
    /// not recorded a second time.
    pub async fn replay_errors(&self, category: &str) -> TrackingResult<ReplaySummary> {
        let category = Category::parse(category, &self.settings)?;
        let error_table = category.error_table(&self.settings).to_string();
        let records = self.sink.replayable(&error_table, category.name()).await?;

        let mut summary = ReplaySummary {
            category: category.name().to_string(),
            error_table,
            replayed: records.len(),
            succeeded: 0,
            failed: 0,
            failures: Vec::new(),
        };

        for record in records {
            let result = match &category {
                Category::Orders => self.process_order(&record.raw).await,
                Category::Subscriptions => {
                    let trigger = record
                        .context
                        .additional
                        .get("trigger")
                        .map(String::as_str)
                        .filter(|t| *t != "unknown");
                    self.process_subscription(&record.raw, trigger).await
                }
                Category::PageTracker => self.process_page(&record.raw).await,
                Category::AppendOnly(name) => self.process_append_only(name, &record.raw).await,
            };

            match result {
                Ok(_) => summary.succeeded += 1,
                Err(e) => {
                    tracing::debug!(row_id = %record.row_id, error = %e, "Replay failed");
                    summary.failed += 1;
                    summary.failures.push(ReplayFailure {
                        row_id: record.row_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            category = %summary.category,
            replayed = summary.replayed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Error replay finished"
        );
        Ok(summary)
    }

    async fn process_order(&self, raw: &str) -> TrackingResult<IngestResponse> {
        let fields = Fields::parse(raw)?;
        let payload = OrderPayload::from_fields(&fields)?;

        let product = orders::lookup_product_name(
            self.store.as_ref(),
            &self.settings.orders.product_dictionary_table,
            payload.product_id.as_deref(),
        )
        .await;
        let order_id = payload.order_id.clone();
        let event = payload.into_event(product, &self.settings.orders, Utc::now());
        let key = event.key.clone();
        let status = event.status.clone();

        let outcome = self.orders.apply(event).await?;

        self.hooks.dispatch(
            CommitOutcome::new(orders::CATEGORY, key.as_str())
                .with_status(status.as_str())
                .with_table(outcome.inserted_into.clone()),
        );

        Ok(IngestResponse::success("Order update processed successfully", key.as_str())
            .with("orderId", order_id)
            .with("status", status)
            .with("targetTab", outcome.inserted_into)
            .with("removedFrom", outcome.removed_from)
            .with("keptIn", outcome.kept_in))
    }

    async fn process_subscription(
        &self,
        raw: &str,
        trigger: Option<&str>,
    ) -> TrackingResult<IngestResponse> {
        let fields = Fields::parse(raw)?;
        let payload = SubscriptionPayload::from_fields(&fields)?;
        let resolved = subscriptions::resolve_trigger(&self.settings.subscriptions, trigger);

        let event = payload.into_event(&resolved, raw, Utc::now());
        let key = event.key.clone();
        let status = event.status.clone();

        let outcome = self.subscriptions.apply(event).await?;

        self.hooks.dispatch(
            CommitOutcome::new(subscriptions::CATEGORY, key.as_str())
                .with_status(status)
                .with_table(outcome.inserted_into.clone()),
        );

        Ok(
            IngestResponse::success("Subscription data processed successfully", key.as_str())
                .with("subscriptionId", key)
                .with("trigger", resolved.trigger)
                .with("targetTab", outcome.inserted_into)
                .with("removedFrom", outcome.removed_from)
                .with("keptIn", outcome.kept_in),
        )
    }

    async fn process_page(&self, raw: &str) -> TrackingResult<IngestResponse> {
        let fields = Fields::parse(raw)?;
        let submission = PageSubmission::from_fields(&fields)?;

        let outcome = self.progress.record(&submission, Utc::now()).await?;

        self.hooks.dispatch(
            CommitOutcome::new(page::CATEGORY, submission.entry_id.as_str())
                .with_table(Some(self.settings.page_tracker.tracker_table.clone())),
        );

        Ok(
            IngestResponse::success("Page tracking processed successfully", submission.entry_id.as_str())
                .with("entryId", submission.entry_id)
                .with("action", outcome.action.as_str())
                .with("loggedForward", outcome.logged_forward)
                .with("furthestIndex", outcome.furthest_index),
        )
    }

    async fn process_append_only(&self, category: &str, raw: &str) -> TrackingResult<IngestResponse> {
        let table = self
            .settings
            .append_only
            .categories
            .get(category)
            .ok_or_else(|| TrackingError::UnknownCategory(category.to_string()))?;

        let fields = Fields::parse(raw)?;
        let entry = AppendOnlyEntry::from_fields(&fields);

        self.store
            .ensure_table(table, &headers(APPEND_HEADERS))
            .await?;
        self.store
            .append_row(table, entry.row(raw, Utc::now()))
            .await?;

        let key = entry.key.unwrap_or_default();
        tracing::info!(category = category, table = %table, key = %key, "Webhook data logged");

        let mut outcome =
            CommitOutcome::new(category, key.as_str()).with_table(Some(table.clone()));
        if let Some(status) = entry.status {
            outcome = outcome.with_status(status);
        }
        self.hooks.dispatch(outcome);

        Ok(IngestResponse::success("Data logged successfully", key)
            .with("category", category)
            .with("table", table.as_str()))
    }

    async fn fail(
        &self,
        category: &Category,
        error: TrackingError,
        raw: &str,
        context: ErrorContext,
        message: &str,
    ) -> IngestResponse {
        redacted_error!(
            self.redactor,
            raw,
            category = category.name(),
            error_type = error.error_type(),
            error = %error,
            "Webhook processing failed"
        );

        self.sink
            .record(category.error_table(&self.settings), &error, raw, &context)
            .await;

        let message = match &error {
            TrackingError::MissingField(reason) => reason.clone(),
            _ => message.to_string(),
        };
        IngestResponse::failure(message, &error)
    }
}
