use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapter::{
    MemcachedAdapter, MemoryAdapter, PerKeyFileAdapter, RedisAdapter, SingleFileAdapter,
    StorageAdapter,
};
use crate::core::{CacheError, Result};
use crate::manager::CacheManager;

/// Construction parameters for one adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum AdapterConfig {
    Memory,
    SingleFile { path: PathBuf },
    PerKeyFile { directory: PathBuf },
    Redis { host: String, port: u16 },
    Memcached { host: String, port: u16 },
}

impl AdapterConfig {
    /// Build the adapter this configuration describes
    pub fn build(&self) -> Result<Arc<dyn StorageAdapter>> {
        Ok(match self {
            Self::Memory => Arc::new(MemoryAdapter::new()),
            Self::SingleFile { path } => Arc::new(SingleFileAdapter::new(path)?),
            Self::PerKeyFile { directory } => Arc::new(PerKeyFileAdapter::new(directory)?),
            Self::Redis { host, port } => Arc::new(RedisAdapter::new(host, *port)?),
            Self::Memcached { host, port } => Arc::new(MemcachedAdapter::new(host, *port)?),
        })
    }
}

/// Top-level cache configuration: the default adapter plus any number of
/// named extras
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub default: AdapterConfig,
    #[serde(default)]
    pub adapters: HashMap<String, AdapterConfig>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default: AdapterConfig::Memory,
            adapters: HashMap::new(),
        }
    }
}

impl CacheConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            CacheError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_yaml::from_str(&contents)
            .map_err(|e| CacheError::Config(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Build a [`CacheManager`] with every configured adapter registered
    pub fn build_manager(&self) -> Result<CacheManager> {
        let mut manager = CacheManager::new(self.default.build()?);
        for (name, config) in &self.adapters {
            manager.add_adapter(name.clone(), config.build()?)?;
        }
        Ok(manager)
    }
}
