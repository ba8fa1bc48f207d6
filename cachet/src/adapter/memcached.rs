use super::{DeferredQueue, StorageAdapter};
use crate::core::{CacheError, CacheItem, Result, StoredEntry, now_ts};
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Adapter backed by a Memcached-compatible server.
///
/// Same storage scheme as the Redis adapter: entries are JSON strings, the
/// remaining TTL is computed at save time and handed to the server (`0`
/// meaning never expire). `clear` maps to `flush`; sizes come from the
/// server's `stats` output.
pub struct MemcachedAdapter {
    client: Mutex<memcache::Client>,
    deferred: DeferredQueue,
}

impl MemcachedAdapter {
    /// Connect to the server at `host:port`. Connection failure is fatal.
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let url = format!("memcache://{host}:{port}");
        let client = memcache::Client::connect(url.as_str())
            .map_err(|e| CacheError::Connection(format!("cannot connect to {url}: {e}")))?;

        Ok(Self {
            client: Mutex::new(client),
            deferred: DeferredQueue::new(),
        })
    }

    fn stat_value(&self, stat: &str) -> Option<u64> {
        let stats = {
            let client = self.client.lock();
            match client.stats() {
                Ok(stats) => stats,
                Err(e) => {
                    warn!("Memcached STATS failed: {}", e);
                    return None;
                }
            }
        };

        stats
            .iter()
            .find_map(|(_, fields)| fields.get(stat))
            .and_then(|value| value.parse().ok())
    }
}

impl StorageAdapter for MemcachedAdapter {
    fn get_item(&self, key: &str) -> CacheItem {
        let payload: Option<String> = {
            let client = self.client.lock();
            match client.get(key) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Memcached GET failed for {}: {}", key, e);
                    return CacheItem::miss(key);
                }
            }
        };

        let Some(payload) = payload else {
            return CacheItem::miss(key);
        };

        let entry: StoredEntry = match serde_json::from_str(&payload) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Corrupt entry for key {}: {}", key, e);
                return CacheItem::miss(key);
            }
        };

        if entry.is_expired() {
            debug!("Key expired: {}", key);
            self.delete_item(key);
            return CacheItem::miss(key);
        }

        let mut item = CacheItem::new(key);
        item.set(entry.value).expires_at(entry.expiration);
        item
    }

    fn save(&self, item: &CacheItem) -> bool {
        let value = item.get().cloned().unwrap_or(serde_json::Value::Null);
        let entry = StoredEntry::new(value, item.expiration_time());

        let payload = match serde_json::to_string(&entry) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Cannot serialize entry for key {}: {}", item.key(), e);
                return false;
            }
        };

        // 0 means "never expire" in the memcached protocol
        let expire = match entry.expiration.map(|at| at - now_ts()) {
            Some(secs) if secs > 0 => secs.min(u32::MAX as i64) as u32,
            _ => 0,
        };

        let client = self.client.lock();
        match client.set(item.key(), payload.as_str(), expire) {
            Ok(()) => true,
            Err(e) => {
                warn!("Memcached SET failed for {}: {}", item.key(), e);
                false
            }
        }
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
        let client = self.client.lock();
        match client.delete(key) {
            Ok(removed) => removed,
            Err(e) => {
                warn!("Memcached DELETE failed for {}: {}", key, e);
                false
            }
        }
    }

    fn clear(&self) -> bool {
        let client = self.client.lock();
        match client.flush() {
            Ok(()) => true,
            Err(e) => {
                warn!("Memcached FLUSH failed: {}", e);
                false
            }
        }
    }

    /// Reported memory usage (`bytes` from `stats`)
    fn cache_size(&self) -> u64 {
        self.stat_value("bytes").unwrap_or(0)
    }

    fn item_count(&self) -> usize {
        self.stat_value("curr_items").unwrap_or(0) as usize
    }
}
