use super::types::now_ts;
use serde_json::Value;
use std::time::Duration;

/// A single cache entry handled as a unit: key, value, hit flag and an
/// optional absolute expiration instant.
///
/// Items are pure in-memory state. Mutators return `&mut Self` for chaining
/// and never touch backing storage; persistence goes through a
/// [`StorageAdapter`](crate::adapter::StorageAdapter).
#[derive(Debug, Clone, PartialEq)]
pub struct CacheItem {
    key: String,
    value: Option<Value>,
    hit: bool,
    /// Absolute Unix timestamp in seconds, `None` = never expires
    expiration: Option<i64>,
}

impl CacheItem {
    /// Create an empty, non-hit item for the given key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            hit: false,
            expiration: None,
        }
    }

    /// Miss item returned by adapters for absent, expired or corrupt keys
    pub(crate) fn miss(key: impl Into<String>) -> Self {
        Self::new(key)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// True iff the value came from a successful lookup (or was set) and the
    /// expiration, when present, is strictly in the future.
    pub fn is_hit(&self) -> bool {
        self.hit && !self.has_expired()
    }

    /// Set the value and mark the item as a hit
    pub fn set(&mut self, value: Value) -> &mut Self {
        self.value = Some(value);
        self.hit = true;
        self
    }

    /// Absolute expiration timestamp, `None` for persistent items
    pub fn expiration_time(&self) -> Option<i64> {
        self.expiration
    }

    /// Set an absolute expiration instant; `None` clears it
    pub fn expires_at(&mut self, timestamp: Option<i64>) -> &mut Self {
        self.expiration = timestamp;
        self
    }

    /// Set the expiration relative to now; `None` clears it
    pub fn expires_after(&mut self, duration: Option<Duration>) -> &mut Self {
        self.expiration = duration.map(|d| now_ts() + d.as_secs() as i64);
        self
    }

    /// Seconds until expiration, or `None` if the item is persistent or has
    /// already expired
    pub fn time_until_expiration(&self) -> Option<i64> {
        let at = self.expiration?;
        let remaining = at - now_ts();
        if remaining > 0 { Some(remaining) } else { None }
    }

    /// Force the item into an immediately-expired state
    pub fn invalidate(&mut self) -> &mut Self {
        self.expiration = Some(now_ts());
        self
    }

    pub fn has_expired(&self) -> bool {
        self.expiration.is_some_and(|at| now_ts() >= at)
    }

    /// Push the expiration further out, starting from the current expiration
    /// or from now when none is set
    pub fn extend_expiration(&mut self, duration: Duration) -> &mut Self {
        let base = self.expiration.unwrap_or_else(now_ts);
        self.expiration = Some(base + duration.as_secs() as i64);
        self
    }

    /// True iff the item has no expiration
    pub fn is_persistent(&self) -> bool {
        self.expiration.is_none()
    }
}
