//! Customer-support order tracking.
//!
//! One bucket table per tracked order status, named after the status, plus
//! the `full_log` history in the same column order.

use chrono::{DateTime, Utc};
use config_engine::OrdersSettings;
use serde_json::{json, Value};

use super::Fields;
use crate::error::{TrackingError, TrackingResult};
use crate::event::Event;
use crate::profile::{headers, TrackerProfile};
use crate::store::{cell_text, TableStore};
use crate::timestamp::{parse_timestamp_value, timestamp_cell, IncomingTimestamp};

pub const CATEGORY: &str = "orders";

pub const ORDER_HEADERS: &[&str] = &[
    "Order #",
    "Product",
    "Total Amount",
    "Name",
    "Created Date",
    "Last Update",
    "Status",
    "State",
    "Pharmacy",
    "EMR Profile",
];

const KEY_COLUMN: usize = 0;
const TIMESTAMP_COLUMN: usize = 5;

const NOT_AVAILABLE: &str = "N/A";

pub fn profile(settings: &OrdersSettings) -> TrackerProfile {
    TrackerProfile {
        name: CATEGORY.to_string(),
        history_table: settings.history_table.clone(),
        history_headers: headers(ORDER_HEADERS),
        bucket_tables: settings.tracked_statuses.clone(),
        bucket_headers: headers(ORDER_HEADERS),
        key_column: KEY_COLUMN,
        timestamp_column: TIMESTAMP_COLUMN,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderPayload {
    /// CarePortals internal id (`_id`)
    pub order_id: Option<String>,
    /// Customer-facing order number (`id`), the business key
    pub order_number: String,
    pub status: String,
    pub product_id: Option<String>,
    pub total_amount: Value,
    pub customer_id: Option<String>,
    pub customer_first_name: Option<String>,
    pub customer_last_name: Option<String>,
    pub state: Option<String>,
    pub assigned_first_name: Option<String>,
    pub assigned_last_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: IncomingTimestamp,
}

impl OrderPayload {
    pub fn from_fields(fields: &Fields) -> TrackingResult<Self> {
        let order_number = fields
            .text("id")
            .ok_or_else(|| TrackingError::MissingField("Order number (id) is required".into()))?;

        // cells are scalars; structured amounts are kept as their JSON text
        let total_amount = match fields.get("totalAmount") {
            Some(Value::Null) | None => json!(0),
            Some(value @ (Value::Array(_) | Value::Object(_))) => Value::String(value.to_string()),
            Some(value) => value.clone(),
        };

        Ok(Self {
            order_id: fields.text("_id"),
            order_number,
            status: fields.text("status").unwrap_or_else(|| "unknown".to_string()),
            product_id: fields.text("productId"),
            total_amount,
            customer_id: fields.text("customer._id"),
            customer_first_name: fields.text("customer.firstName"),
            customer_last_name: fields.text("customer.lastName"),
            state: fields.text("state"),
            assigned_first_name: fields.text("assignedTo.firstName"),
            assigned_last_name: fields.text("assignedTo.lastName"),
            created_at: fields.get("createdAt").and_then(parse_timestamp_value),
            updated_at: IncomingTimestamp::from_field(fields.get("updatedAt")),
        })
    }

    pub fn customer_name(&self) -> String {
        join_name(&self.customer_first_name, &self.customer_last_name)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// The pharmacy an order is assigned to is stored as a person-like name
    pub fn pharmacy(&self) -> String {
        join_name(&self.assigned_first_name, &self.assigned_last_name)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn emr_profile(&self, base_url: &str) -> String {
        match &self.customer_id {
            Some(id) => format!("{}/{}?tab=orders", base_url.trim_end_matches('/'), id),
            None => NOT_AVAILABLE.to_string(),
        }
    }

    pub fn into_event(
        self,
        product_name: String,
        settings: &OrdersSettings,
        received_at: DateTime<Utc>,
    ) -> Event {
        let updated_at = self.updated_at.resolve(received_at);
        let bucket = settings
            .tracked_statuses
            .iter()
            .find(|status| **status == self.status)
            .cloned();

        let record = vec![
            Value::String(self.order_number.clone()),
            Value::String(product_name),
            self.total_amount.clone(),
            Value::String(self.customer_name()),
            self.created_at.map_or(Value::Null, timestamp_cell),
            self.updated_at.cell(received_at),
            Value::String(self.status.clone()),
            Value::String(self.state.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())),
            Value::String(self.pharmacy()),
            Value::String(self.emr_profile(&settings.emr_profile_base_url)),
        ];

        Event {
            key: self.order_number,
            status: self.status,
            updated_at,
            bucket,
            history: record.clone(),
            record,
        }
    }
}

fn join_name(first: &Option<String>, last: &Option<String>) -> Option<String> {
    let joined = format!(
        "{} {}",
        first.as_deref().unwrap_or_default(),
        last.as_deref().unwrap_or_default()
    );
    let joined = joined.trim();
    (!joined.is_empty()).then(|| joined.to_string())
}

/// Product name from the dictionary table (column A id, column B name).
///
/// Falls back to the product id when the table, the row or the name is
/// missing, and to `N/A` when the order has no product id.
pub async fn lookup_product_name(
    store: &dyn TableStore,
    table: &str,
    product_id: Option<&str>,
) -> String {
    let Some(product_id) = product_id else {
        return NOT_AVAILABLE.to_string();
    };

    match store.find_rows(table, 0, product_id).await {
        Ok(rows) => rows
            .first()
            .and_then(|row| cell_text(row.cell(1)))
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| product_id.to_string()),
        Err(e) => {
            tracing::warn!(
                table = table,
                product_id = product_id,
                error = %e,
                "Product lookup failed, using product id"
            );
            product_id.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryTableStore;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"{
        "_id": "7893efc2581fe0505d48c681",
        "id": 9876,
        "customer.firstName": "Jane",
        "customer.lastName": "Doe",
        "customer._id": "7820cf7b9fdd8c7aae179818",
        "status": "pending",
        "createdAt": "2024-07-25T10:00:00.000Z",
        "updatedAt": "2024-07-25T10:05:00.000Z",
        "state": "NY",
        "productId": "778e289d7ea1698a8757aa44",
        "totalAmount": 99.50,
        "assignedTo.firstName": "CityCentral",
        "assignedTo.lastName": "Pharmacy"
    }"#;

    #[test]
    fn test_sample_order_maps_to_row() {
        let settings = OrdersSettings::default();
        let payload = OrderPayload::from_fields(&Fields::parse(SAMPLE).unwrap()).unwrap();
        let event = payload.into_event("Semaglutide".into(), &settings, Utc::now());

        assert_eq!(event.key, "9876");
        assert_eq!(event.bucket.as_deref(), Some("pending"));
        assert_eq!(
            event.updated_at,
            Some(Utc.with_ymd_and_hms(2024, 7, 25, 10, 5, 0).unwrap())
        );
        assert_eq!(event.record.len(), ORDER_HEADERS.len());
        assert_eq!(event.record[1], "Semaglutide");
        assert_eq!(event.record[3], "Jane Doe");
        assert_eq!(event.record[8], "CityCentral Pharmacy");
        assert_eq!(
            event.record[9],
            "https://emr.portals.care/customers/7820cf7b9fdd8c7aae179818?tab=orders"
        );
        assert_eq!(event.history, event.record);
    }

    #[test]
    fn test_missing_order_number_is_rejected() {
        let fields = Fields::parse(r#"{"status":"pending"}"#).unwrap();
        assert!(matches!(
            OrderPayload::from_fields(&fields),
            Err(TrackingError::MissingField(_))
        ));
    }

    #[test]
    fn test_untracked_status_has_no_bucket_and_defaults() {
        let received = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let fields = Fields::parse(r#"{"id":"1001","status":"shipped"}"#).unwrap();
        let event = OrderPayload::from_fields(&fields)
            .unwrap()
            .into_event("N/A".into(), &OrdersSettings::default(), received);

        assert_eq!(event.bucket, None);
        assert_eq!(event.updated_at, Some(received));
        assert_eq!(event.record[3], "N/A");
        assert_eq!(event.record[8], "N/A");
        assert_eq!(event.record[9], "N/A");
    }

    #[test]
    fn test_unreadable_update_time_has_no_event_time() {
        let received = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let fields =
            Fields::parse(r#"{"id":"K1","status":"processing","updatedAt":"garbage"}"#).unwrap();
        let event = OrderPayload::from_fields(&fields)
            .unwrap()
            .into_event("N/A".into(), &OrdersSettings::default(), received);

        assert_eq!(event.updated_at, None);
        assert_eq!(event.record[5], "garbage");
    }

    #[test]
    fn test_structured_total_amount_becomes_text() {
        let fields =
            Fields::parse(r#"{"id":"K2","totalAmount":{"value":42,"currency":"USD"}}"#).unwrap();
        let payload = OrderPayload::from_fields(&fields).unwrap();
        let text = payload.total_amount.as_str().unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(text).unwrap(),
            json!({"value": 42, "currency": "USD"})
        );

        let fields = Fields::parse(r#"{"id":"K3","totalAmount":12.5}"#).unwrap();
        assert_eq!(OrderPayload::from_fields(&fields).unwrap().total_amount, json!(12.5));
    }

    #[tokio::test]
    async fn test_product_lookup_fallbacks() {
        let store = InMemoryTableStore::new();
        assert_eq!(lookup_product_name(&store, "product_dictionary", None).await, "N/A");
        assert_eq!(
            lookup_product_name(&store, "product_dictionary", Some("p1")).await,
            "p1"
        );

        store
            .ensure_table("product_dictionary", &headers(&["Product ID", "Product Name"]))
            .await
            .unwrap();
        store
            .append_row("product_dictionary", vec![json!("p1"), json!("Tirzepatide")])
            .await
            .unwrap();
        store
            .append_row("product_dictionary", vec![json!("p2"), json!("")])
            .await
            .unwrap();

        assert_eq!(
            lookup_product_name(&store, "product_dictionary", Some("p1")).await,
            "Tirzepatide"
        );
        assert_eq!(
            lookup_product_name(&store, "product_dictionary", Some("p2")).await,
            "p2"
        );
    }
}
