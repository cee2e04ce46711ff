//! Subscription status tabs.
//!
//! The bucket comes from the webhook `trigger` query parameter rather than
//! the payload status; absent or unknown triggers land in the default
//! bucket.

use chrono::{DateTime, Utc};
use config_engine::SubscriptionSettings;
use serde_json::Value;

use super::{text_cell, Fields};
use crate::error::{TrackingError, TrackingResult};
use crate::event::Event;
use crate::profile::{headers, TrackerProfile};
use crate::timestamp::{parse_timestamp_value, timestamp_cell, IncomingTimestamp};

pub const CATEGORY: &str = "subscriptions";

pub const SUBSCRIPTION_HEADERS: &[&str] = &[
    "SubscriptionID",
    "CustomerID",
    "ProductID",
    "Cycle",
    "Status",
    "Datetime Created",
    "Last Updated",
];

pub const HISTORY_HEADERS: &[&str] = &[
    "Datetime Received",
    "Trigger Type",
    "SubscriptionID",
    "CustomerID",
    "ProductID",
    "Cycle",
    "Status",
    "Datetime Created",
    "Last Updated",
    "Raw Data",
];

const KEY_COLUMN: usize = 0;
const TIMESTAMP_COLUMN: usize = 6;

pub fn profile(settings: &SubscriptionSettings) -> TrackerProfile {
    TrackerProfile {
        name: CATEGORY.to_string(),
        history_table: settings.history_table.clone(),
        history_headers: headers(HISTORY_HEADERS),
        bucket_tables: settings.buckets.values().cloned().collect(),
        bucket_headers: headers(SUBSCRIPTION_HEADERS),
        key_column: KEY_COLUMN,
        timestamp_column: TIMESTAMP_COLUMN,
    }
}

/// A trigger resolved to its bucket table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrigger {
    /// Trigger as received, or the default when none was sent
    pub trigger: String,
    pub table: String,
}

pub fn resolve_trigger(settings: &SubscriptionSettings, trigger: Option<&str>) -> ResolvedTrigger {
    let trigger = trigger
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(settings.default_trigger.as_str())
        .to_string();

    let table = match settings.buckets.get(&trigger) {
        Some(table) => table.clone(),
        None => {
            tracing::warn!(
                trigger = %trigger,
                default = %settings.default_trigger,
                "Unknown trigger type, using default bucket"
            );
            settings
                .buckets
                .get(&settings.default_trigger)
                .cloned()
                .unwrap_or_default()
        }
    };

    ResolvedTrigger { trigger, table }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionPayload {
    pub subscription_id: String,
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    pub cycle: Option<String>,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: IncomingTimestamp,
}

impl SubscriptionPayload {
    pub fn from_fields(fields: &Fields) -> TrackingResult<Self> {
        let subscription_id = fields
            .text("_id")
            .ok_or_else(|| TrackingError::MissingField("Subscription id (_id) is required".into()))?;

        Ok(Self {
            subscription_id,
            customer_id: fields.text("customer._id"),
            product_id: fields.first_text(&["product._id", "product"]),
            cycle: fields.text("currentCycle"),
            status: fields.text("status").unwrap_or_default(),
            created_at: fields.get("createdAt").and_then(parse_timestamp_value),
            updated_at: IncomingTimestamp::from_field(fields.get("updatedAt")),
        })
    }

    pub fn into_event(
        self,
        trigger: &ResolvedTrigger,
        raw: &str,
        received_at: DateTime<Utc>,
    ) -> Event {
        let updated_at = self.updated_at.resolve(received_at);
        let updated_cell = self.updated_at.cell(received_at);
        let created = self.created_at.map_or(Value::Null, timestamp_cell);

        let record = vec![
            Value::String(self.subscription_id.clone()),
            text_cell(self.customer_id.clone()),
            text_cell(self.product_id.clone()),
            text_cell(self.cycle.clone()),
            Value::String(self.status.clone()),
            created.clone(),
            updated_cell.clone(),
        ];

        let history = vec![
            timestamp_cell(received_at),
            Value::String(trigger.trigger.clone()),
            Value::String(self.subscription_id.clone()),
            text_cell(self.customer_id),
            text_cell(self.product_id),
            text_cell(self.cycle),
            Value::String(self.status.clone()),
            created,
            updated_cell,
            Value::String(raw.to_string()),
        ];

        Event {
            key: self.subscription_id,
            status: self.status,
            updated_at,
            bucket: Some(trigger.table.clone()),
            record,
            history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "_id": "test_subscription_123456789",
        "customer": {"_id": "test_customer_123456789", "email": "test@example.com"},
        "product": "test_product_123456789",
        "currentCycle": 1,
        "status": "active",
        "createdAt": "2025-01-15T15:30:00Z",
        "updatedAt": "2025-01-15T15:30:00Z"
    }"#;

    #[test]
    fn test_triggers_resolve_to_buckets() {
        let settings = SubscriptionSettings::default();

        let paused = resolve_trigger(&settings, Some("paused"));
        assert_eq!(paused.table, "subscription.paused");

        let absent = resolve_trigger(&settings, None);
        assert_eq!(absent.trigger, "active");
        assert_eq!(absent.table, "subscription.active");

        let unknown = resolve_trigger(&settings, Some("subscription.created"));
        assert_eq!(unknown.trigger, "subscription.created");
        assert_eq!(unknown.table, "subscription.active");
    }

    #[test]
    fn test_nested_payload_maps_to_rows() {
        let settings = SubscriptionSettings::default();
        let trigger = resolve_trigger(&settings, Some("cancelled"));
        let payload = SubscriptionPayload::from_fields(&Fields::parse(SAMPLE).unwrap()).unwrap();
        let event = payload.into_event(&trigger, SAMPLE, Utc::now());

        assert_eq!(event.key, "test_subscription_123456789");
        assert_eq!(event.bucket.as_deref(), Some("subscription.cancelled"));
        assert_eq!(event.record.len(), SUBSCRIPTION_HEADERS.len());
        assert_eq!(event.record[1], "test_customer_123456789");
        assert_eq!(event.record[2], "test_product_123456789");
        assert_eq!(event.record[3], "1");
        assert_eq!(event.history.len(), HISTORY_HEADERS.len());
        assert_eq!(event.history[1], "cancelled");
        assert_eq!(event.history[9], SAMPLE);
    }

    #[test]
    fn test_profile_scans_every_bucket() {
        let profile = profile(&SubscriptionSettings::default());
        assert_eq!(profile.bucket_tables.len(), 3);
        assert!(profile.is_bucket("subscription.paused"));
        assert!(!profile.is_bucket("subscription.full_log"));
    }
}
