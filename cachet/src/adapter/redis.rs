use super::{DeferredQueue, StorageAdapter};
use crate::core::{CacheError, CacheItem, Result, StoredEntry, now_ts};
use parking_lot::Mutex;
use redis::{Commands, Connection};
use tracing::{debug, warn};

/// Adapter backed by a Redis-compatible server.
///
/// Entries are stored as JSON strings under their plain key. The remaining
/// TTL is computed from the absolute expiration at save time and handed to
/// the server, which then owns the purge; a non-positive or absent TTL is
/// stored without expiration. Single-key atomicity is delegated to the
/// server's own guarantees.
pub struct RedisAdapter {
    conn: Mutex<Connection>,
    deferred: DeferredQueue,
}

impl RedisAdapter {
    /// Connect to the server at `host:port`. Connection failure is fatal.
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let url = format!("redis://{host}:{port}/");
        let client = redis::Client::open(url.as_str())
            .map_err(|e| CacheError::Connection(format!("invalid redis target {url}: {e}")))?;
        let conn = client
            .get_connection()
            .map_err(|e| CacheError::Connection(format!("cannot connect to {url}: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
            deferred: DeferredQueue::new(),
        })
    }
}

impl StorageAdapter for RedisAdapter {
    fn get_item(&self, key: &str) -> CacheItem {
        let payload: Option<String> = {
            let mut conn = self.conn.lock();
            match conn.get(key) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Redis GET failed for {}: {}", key, e);
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

        // The server purges on TTL, but an entry saved without one can still
        // carry a past expiration
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

        let ttl = entry.expiration.map(|at| at - now_ts());
        let mut conn = self.conn.lock();
        let result = match ttl {
            Some(secs) if secs > 0 => conn.set_ex::<_, _, ()>(item.key(), payload, secs as u64),
            _ => conn.set::<_, _, ()>(item.key(), payload),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Redis SET failed for {}: {}", item.key(), e);
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
        let mut conn = self.conn.lock();
        match conn.del::<_, i64>(key) {
            Ok(removed) => removed > 0,
            Err(e) => {
                warn!("Redis DEL failed for {}: {}", key, e);
                false
            }
        }
    }

    fn clear(&self) -> bool {
        let mut conn = self.conn.lock();
        match redis::cmd("FLUSHDB").query::<()>(&mut *conn) {
            Ok(()) => true,
            Err(e) => {
                warn!("Redis FLUSHDB failed: {}", e);
                false
            }
        }
    }

    /// Reported memory usage (`used_memory` from `INFO memory`)
    fn cache_size(&self) -> u64 {
        let info: String = {
            let mut conn = self.conn.lock();
            match redis::cmd("INFO").arg("memory").query(&mut *conn) {
                Ok(info) => info,
                Err(e) => {
                    warn!("Redis INFO failed: {}", e);
                    return 0;
                }
            }
        };

        info.lines()
            .find_map(|line| line.strip_prefix("used_memory:"))
            .and_then(|bytes| bytes.trim().parse().ok())
            .unwrap_or(0)
    }

    fn item_count(&self) -> usize {
        let mut conn = self.conn.lock();
        match redis::cmd("DBSIZE").query::<i64>(&mut *conn) {
            Ok(count) => count.max(0) as usize,
            Err(e) => {
                warn!("Redis DBSIZE failed: {}", e);
                0
            }
        }
    }
}

// Requires a Redis server on 127.0.0.1:6379
#[cfg(all(test, feature = "live-backend-tests"))]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn adapter() -> RedisAdapter {
        let adapter = RedisAdapter::new("127.0.0.1", 6379).unwrap();
        adapter.clear();
        adapter
    }

    #[test]
    fn test_round_trip() {
        let adapter = adapter();

        let mut item = CacheItem::new("k");
        item.set(json!({"n": 1})).expires_after(Some(Duration::from_secs(60)));
        assert!(adapter.save(&item));

        let fetched = adapter.get_item("k");
        assert!(fetched.is_hit());
        assert_eq!(fetched.get(), Some(&json!({"n": 1})));
        assert_eq!(fetched.expiration_time(), item.expiration_time());
    }

    #[test]
    fn test_expiry() {
        let adapter = adapter();

        let mut item = CacheItem::new("short");
        item.set(json!("v")).expires_after(Some(Duration::from_secs(1)));
        adapter.save(&item);
        assert!(adapter.has_item("short"));

        std::thread::sleep(Duration::from_secs(2));
        assert!(!adapter.has_item("short"));
    }

    #[test]
    fn test_delete_and_clear() {
        let adapter = adapter();

        let mut item = CacheItem::new("k");
        item.set(json!("v"));
        adapter.save(&item);

        assert!(adapter.delete_item("k"));
        assert!(!adapter.delete_item("k"));

        adapter.save(&item);
        assert!(adapter.clear());
        assert_eq!(adapter.item_count(), 0);
    }
}
