//! Typed configuration tree for the tracker service

use logger_redacted::LoggerConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub logging: LoggerConfig,
    pub orders: OrdersSettings,
    pub subscriptions: SubscriptionSettings,
    pub page_tracker: PageTrackerSettings,
    pub append_only: AppendOnlySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            name: "CarePortals Tracker".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    Memory,
    File,
    Postgres,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackendKind,
    /// Workbook file for the `file` backend
    pub path: PathBuf,
    /// Connection string for the `postgres` backend
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::Memory,
            path: PathBuf::from("data/workbook.json"),
            database_url: None,
            max_connections: 5,
        }
    }
}

/// Customer-support order tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrdersSettings {
    pub history_table: String,
    /// Each tracked status is its own bucket table, named after the status
    pub tracked_statuses: Vec<String>,
    pub error_table: String,
    pub product_dictionary_table: String,
    pub emr_profile_base_url: String,
}

impl Default for OrdersSettings {
    fn default() -> Self {
        Self {
            history_table: "full_log".to_string(),
            tracked_statuses: [
                "pending",
                "awaiting_payment",
                "awaiting_requirements",
                "awaiting_script",
                "awaiting_shipment",
                "processing",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
            error_table: "Order_Errors".to_string(),
            product_dictionary_table: "product_dictionary".to_string(),
            emr_profile_base_url: "https://emr.portals.care/customers".to_string(),
        }
    }
}

/// Subscription status tabs, bucket chosen by the webhook trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionSettings {
    pub history_table: String,
    /// trigger -> bucket table
    pub buckets: BTreeMap<String, String>,
    /// Trigger used when the request carries none or an unknown one
    pub default_trigger: String,
    pub error_table: String,
}

impl Default for SubscriptionSettings {
    fn default() -> Self {
        let buckets = [
            ("active", "subscription.active"),
            ("paused", "subscription.paused"),
            ("cancelled", "subscription.cancelled"),
        ]
        .iter()
        .map(|(trigger, table)| ((*trigger).to_string(), (*table).to_string()))
        .collect();

        Self {
            history_table: "subscription.full_log".to_string(),
            buckets,
            default_trigger: "active".to_string(),
            error_table: "Subscription_Errors".to_string(),
        }
    }
}

/// Embeddables page-progress tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageTrackerSettings {
    pub tracker_table: String,
    pub log_table: String,
    pub error_table: String,
}

impl Default for PageTrackerSettings {
    fn default() -> Self {
        Self {
            tracker_table: "page.tracker".to_string(),
            log_table: "page.tracker_log".to_string(),
            error_table: "page.tracker_errors".to_string(),
        }
    }
}

/// Categories that are only appended to their own table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppendOnlySettings {
    /// category -> table
    pub categories: BTreeMap<String, String>,
    pub error_table: String,
}

impl Default for AppendOnlySettings {
    fn default() -> Self {
        let categories = [
            "order.created",
            "order.updated",
            "prescription.created",
            "survey.started",
            "checkout.sessions",
            "messages.customer_support",
            "medication_v1.submissions",
        ]
        .iter()
        .map(|c| ((*c).to_string(), (*c).to_string()))
        .collect();

        Self {
            categories,
            error_table: "Errors".to_string(),
        }
    }
}
