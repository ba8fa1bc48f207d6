pub mod deferred;
pub mod memcached;
pub mod memory;
pub mod per_key_file;
pub mod redis;
pub mod single_file;

pub use deferred::DeferredQueue;
pub use memcached::MemcachedAdapter;
pub use memory::MemoryAdapter;
pub use per_key_file::PerKeyFileAdapter;
pub use self::redis::RedisAdapter;
pub use single_file::SingleFileAdapter;

use crate::core::CacheItem;
use std::collections::HashMap;

/// Uniform capability contract over a backing store.
///
/// One adapter instance owns one namespace. Lookup never fails: absent,
/// expired and corrupt entries all come back as non-hit items. Runtime I/O
/// failures during mutation are reported as `false` return values, never as
/// errors; only construction can fail.
pub trait StorageAdapter: Send + Sync {
    /// Fetch the item stored under `key`.
    ///
    /// On a miss returns an empty non-hit item for that key. An entry found
    /// to be expired is purged from the backing store before the miss is
    /// returned.
    fn get_item(&self, key: &str) -> CacheItem;

    /// Resolve several keys independently via [`get_item`](Self::get_item).
    /// Keys absent from the store still appear in the result as miss items.
    fn get_items(&self, keys: &[&str]) -> HashMap<String, CacheItem> {
        keys.iter()
            .map(|key| ((*key).to_string(), self.get_item(key)))
            .collect()
    }

    /// Check whether a live (non-expired) item exists under `key`
    fn has_item(&self, key: &str) -> bool {
        self.get_item(key).is_hit()
    }

    /// Persist key, value and absolute expiration. Returns `false` on any
    /// I/O failure.
    fn save(&self, item: &CacheItem) -> bool;

    /// Stage the item in the adapter's in-memory deferred queue. A later
    /// call for the same key overwrites the earlier staged item. Backing
    /// storage is not touched.
    fn save_deferred(&self, item: &CacheItem) -> bool;

    /// Persist every staged item via [`save`](Self::save), then clear the
    /// queue. Best-effort batch, not a transaction: items that were saved
    /// before a failure stay saved. Returns `true` only if every staged
    /// save succeeded; the queue is empty afterwards either way.
    fn commit(&self) -> bool;

    /// Remove the entry under `key`. Returns `true` only if something
    /// existed and was removed.
    fn delete_item(&self, key: &str) -> bool;

    /// Delete several keys, each attempted independently. Returns `true`
    /// iff at least one key was actually removed.
    fn delete_items(&self, keys: &[&str]) -> bool {
        let mut any = false;
        for key in keys {
            if self.delete_item(key) {
                any = true;
            }
        }
        any
    }

    /// Remove all items in this adapter's namespace
    fn clear(&self) -> bool;

    /// Backend-defined size: byte size for file-backed stores, reported
    /// memory usage for network stores, item count for the memory store
    fn cache_size(&self) -> u64;

    /// Number of live items. Entries are not expiration-checked, so the
    /// count may include entries that would miss on lookup.
    fn item_count(&self) -> usize;
}
