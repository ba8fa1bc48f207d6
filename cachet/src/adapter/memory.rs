use super::{DeferredQueue, StorageAdapter};
use crate::core::{CacheItem, StoredEntry};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// In-process adapter backed by a plain hash map.
///
/// Nothing survives the instance. Not synchronized beyond the internal lock:
/// concurrent writers to the same key race, last writer wins.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    data: RwLock<HashMap<String, StoredEntry>>,
    deferred: DeferredQueue,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageAdapter for MemoryAdapter {
    fn get_item(&self, key: &str) -> CacheItem {
        let entry = {
            let data = self.data.read();
            data.get(key).cloned()
        };

        match entry {
            Some(entry) if entry.is_expired() => {
                debug!("Key expired: {}", key);
                self.data.write().remove(key);
                CacheItem::miss(key)
            }
            Some(entry) => {
                let mut item = CacheItem::new(key);
                item.set(entry.value).expires_at(entry.expiration);
                item
            }
            None => CacheItem::miss(key),
        }
    }

    fn save(&self, item: &CacheItem) -> bool {
        let value = item.get().cloned().unwrap_or(serde_json::Value::Null);
        let entry = StoredEntry::new(value, item.expiration_time());
        self.data.write().insert(item.key().to_string(), entry);
        true
    }

    fn save_deferred(&self, item: &CacheItem) -> bool {
        self.deferred.stage(item.clone());
        true
    }

    fn commit(&self) -> bool {
        let mut ok = true;
        for item in self.deferred.drain() {
            ok &= self.save(&item);
        }
        ok
    }

    fn delete_item(&self, key: &str) -> bool {
        self.data.write().remove(key).is_some()
    }

    fn clear(&self) -> bool {
        self.data.write().clear();
        true
    }

    fn cache_size(&self) -> u64 {
        // No backing file to measure, report the item count
        self.data.read().len() as u64
    }

    fn item_count(&self) -> usize {
        self.data.read().len()
    }
}
