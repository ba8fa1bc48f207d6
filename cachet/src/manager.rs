use crate::adapter::StorageAdapter;
use crate::core::{CacheError, CacheItem, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Name under which the constructor-supplied adapter is always registered
pub const DEFAULT_ADAPTER: &str = "default";

/// Named registry of storage adapters with one active at a time.
///
/// All item operations delegate verbatim to the active adapter. Switching is
/// a pure reference swap; no data moves between adapters.
pub struct CacheManager {
    adapters: HashMap<String, Arc<dyn StorageAdapter>>,
    active: String,
}

impl CacheManager {
    /// Create a manager with `adapter` registered as `"default"` and active
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        let mut adapters = HashMap::new();
        adapters.insert(DEFAULT_ADAPTER.to_string(), adapter);

        Self {
            adapters,
            active: DEFAULT_ADAPTER.to_string(),
        }
    }

    /// Register an adapter under `name`.
    ///
    /// Fails with [`CacheError::AdapterExists`] if the name is taken; the
    /// existing registration is left untouched.
    pub fn add_adapter(&mut self, name: impl Into<String>, adapter: Arc<dyn StorageAdapter>) -> Result<()> {
        let name = name.into();
        if self.adapters.contains_key(&name) {
            return Err(CacheError::AdapterExists(name));
        }

        info!("Registered cache adapter: {}", name);
        self.adapters.insert(name, adapter);
        Ok(())
    }

    /// Make the adapter registered under `name` the active one.
    ///
    /// Fails with [`CacheError::UnknownAdapter`] if no such registration
    /// exists; the previously active adapter stays active.
    pub fn switch_adapter(&mut self, name: &str) -> Result<()> {
        if !self.adapters.contains_key(name) {
            return Err(CacheError::UnknownAdapter(name.to_string()));
        }

        info!("Switching active cache adapter: {} -> {}", self.active, name);
        self.active = name.to_string();
        Ok(())
    }

    pub fn active_name(&self) -> &str {
        &self.active
    }

    /// The currently active adapter
    pub fn adapter(&self) -> &Arc<dyn StorageAdapter> {
        // The active name is only ever set to a registered key
        &self.adapters[&self.active]
    }

    pub fn get_item(&self, key: &str) -> CacheItem {
        self.adapter().get_item(key)
    }

    pub fn get_items(&self, keys: &[&str]) -> HashMap<String, CacheItem> {
        self.adapter().get_items(keys)
    }

    pub fn has_item(&self, key: &str) -> bool {
        self.adapter().has_item(key)
    }

    pub fn save(&self, item: &CacheItem) -> bool {
        self.adapter().save(item)
    }

    pub fn save_deferred(&self, item: &CacheItem) -> bool {
        self.adapter().save_deferred(item)
    }

    pub fn commit(&self) -> bool {
        self.adapter().commit()
    }

    pub fn delete_item(&self, key: &str) -> bool {
        self.adapter().delete_item(key)
    }

    pub fn delete_items(&self, keys: &[&str]) -> bool {
        self.adapter().delete_items(keys)
    }

    pub fn clear(&self) -> bool {
        self.adapter().clear()
    }

    pub fn cache_size(&self) -> u64 {
        self.adapter().cache_size()
    }

    pub fn item_count(&self) -> usize {
        self.adapter().item_count()
    }
}
