use figment::providers::Serialized;
use figment::Figment;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::providers::{ConfigProvider, ConfigSource};

/// Layers configuration sources over serialized defaults
#[derive(Debug, Clone, Default)]
pub struct ConfigEngine {
    sources: Vec<ConfigSource>,
}

impl ConfigEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Extract `T`, starting from `T::default()`
    pub fn load<T>(&self) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let mut figment = Figment::from(Serialized::defaults(T::default()));
        for source in &self.sources {
            figment = source.merge_into(figment)?;
        }
        Ok(figment.extract()?)
    }
}
