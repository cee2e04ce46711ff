// Configuration sources layered by the engine, later sources win
use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use std::path::PathBuf;

/// A single configuration source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// YAML file; skipped when absent unless `required`
    File { path: PathBuf, required: bool },
    /// Environment variables with a prefix, `__` separating nested keys
    Env { prefix: String },
}

impl ConfigSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            required: false,
        }
    }

    pub fn required_file(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            required: true,
        }
    }

    pub fn env(prefix: impl Into<String>) -> Self {
        Self::Env {
            prefix: prefix.into(),
        }
    }
}

pub trait ConfigProvider {
    /// Layer this source on top of `figment`
    fn merge_into(&self, figment: Figment) -> crate::error::Result<Figment>;
}

impl ConfigProvider for ConfigSource {
    fn merge_into(&self, figment: Figment) -> crate::error::Result<Figment> {
        match self {
            ConfigSource::File { path, required } => {
                if !path.exists() {
                    if *required {
                        return Err(crate::error::ConfigError::SourceNotFound(
                            path.display().to_string(),
                        ));
                    }
                    tracing::debug!(path = %path.display(), "Config file not found, skipping");
                    return Ok(figment);
                }
                Ok(figment.merge(Yaml::file(path)))
            }
            ConfigSource::Env { prefix } => {
                Ok(figment.merge(Env::prefixed(prefix).split("__")))
            }
        }
    }
}
