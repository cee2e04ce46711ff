//! Configuration management for the CarePortals latest-state tracker
//!
//! Configuration is layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults (the sheet tab names already in use)
//! 2. A YAML file (`tracker.yaml` by default)
//! 3. Environment variables prefixed `TRACKER_`, with `__` for nesting
//!    (`TRACKER_SERVER__PORT=9000`, `TRACKER_STORAGE__BACKEND=file`)
//!
//! # Example
//!
//! ```rust,no_run
//! use config_engine::{load_app_config, ConfigValidator};
//!
//! let config = load_app_config("tracker.yaml").unwrap();
//! config.validate().unwrap();
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod engine;
pub mod providers;
pub mod settings;
pub mod validation;
pub mod error;

pub use engine::*;
pub use providers::*;
pub use settings::*;
pub use validation::*;
pub use error::*;

/// Environment prefix for overrides
pub const ENV_PREFIX: &str = "TRACKER_";

/// Load the service configuration from defaults, `path` and the environment
pub fn load_app_config(path: impl Into<std::path::PathBuf>) -> Result<AppConfig> {
    let config: AppConfig = ConfigEngine::new()
        .add_source(ConfigSource::file(path))
        .add_source(ConfigSource::env(ENV_PREFIX))
        .load()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        Jail::expect_with(|_jail| {
            let config = load_app_config("does-not-exist.yaml").map_err(|e| e.to_string())?;
            assert_eq!(config, AppConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "tracker.yaml",
                r#"
server:
  port: 9000
storage:
  backend: file
  path: /tmp/tracker.json
orders:
  tracked_statuses: [pending, processing]
"#,
            )?;
            jail.set_env("TRACKER_SERVER__PORT", "9100");

            let config = load_app_config("tracker.yaml").map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.storage.backend, StorageBackendKind::File);
            assert_eq!(config.orders.tracked_statuses, vec!["pending", "processing"]);
            assert_eq!(config.orders.history_table, "full_log");
            Ok(())
        });
    }

    #[test]
    fn test_required_file_must_exist() {
        Jail::expect_with(|_jail| {
            let result: Result<AppConfig> = ConfigEngine::new()
                .add_source(ConfigSource::required_file("missing.yaml"))
                .load();
            assert!(matches!(result, Err(ConfigError::SourceNotFound(_))));
            Ok(())
        });
    }
}
