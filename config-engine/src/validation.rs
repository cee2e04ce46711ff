// Configuration validation and schema enforcement
use std::collections::BTreeSet;

use crate::error::{ConfigError, Result};
use crate::settings::{AppConfig, StorageBackendKind};

pub trait ConfigValidator {
    fn validate(&self) -> Result<()>;
}

fn require_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!("{} must not be empty", field)));
    }
    Ok(())
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError("server.port must be non-zero".into()));
        }

        if self.storage.backend == StorageBackendKind::Postgres
            && self.storage.database_url.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::ValidationError(
                "storage.database_url is required for the postgres backend".into(),
            ));
        }

        require_name("orders.history_table", &self.orders.history_table)?;
        require_name("orders.error_table", &self.orders.error_table)?;
        if self.orders.tracked_statuses.is_empty() {
            return Err(ConfigError::ValidationError(
                "orders.tracked_statuses must list at least one status".into(),
            ));
        }
        for status in &self.orders.tracked_statuses {
            require_name("orders.tracked_statuses[]", status)?;
            if *status == self.orders.history_table {
                return Err(ConfigError::ValidationError(format!(
                    "order bucket '{}' collides with the history table",
                    status
                )));
            }
        }

        require_name("subscriptions.history_table", &self.subscriptions.history_table)?;
        require_name("subscriptions.error_table", &self.subscriptions.error_table)?;
        if !self
            .subscriptions
            .buckets
            .contains_key(&self.subscriptions.default_trigger)
        {
            return Err(ConfigError::ValidationError(format!(
                "subscriptions.default_trigger '{}' has no bucket",
                self.subscriptions.default_trigger
            )));
        }
        let mut seen = BTreeSet::new();
        for table in self.subscriptions.buckets.values() {
            require_name("subscriptions.buckets[]", table)?;
            if !seen.insert(table) || *table == self.subscriptions.history_table {
                return Err(ConfigError::ValidationError(format!(
                    "subscription bucket table '{}' is used twice",
                    table
                )));
            }
        }

        require_name("page_tracker.tracker_table", &self.page_tracker.tracker_table)?;
        require_name("page_tracker.log_table", &self.page_tracker.log_table)?;
        if self.page_tracker.tracker_table == self.page_tracker.log_table {
            return Err(ConfigError::ValidationError(
                "page_tracker tracker and log tables must differ".into(),
            ));
        }

        require_name("append_only.error_table", &self.append_only.error_table)?;
        for (category, table) in &self.append_only.categories {
            require_name("append_only.categories[]", category)?;
            require_name(category, table)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_postgres_requires_url() {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackendKind::Postgres;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        config.storage.database_url = Some("postgres://localhost/tracker".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_trigger_must_have_bucket() {
        let mut config = AppConfig::default();
        config.subscriptions.default_trigger = "archived".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_subscription_tables_rejected() {
        let mut config = AppConfig::default();
        config
            .subscriptions
            .buckets
            .insert("paused".into(), "subscription.active".into());
        assert!(config.validate().is_err());
    }
}
