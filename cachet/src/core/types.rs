use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persisted form of a cache entry: the value plus an optional absolute
/// expiration as a Unix timestamp in seconds. `None` means the entry never
/// expires.
///
/// A stored record missing either field must fail deserialization, which is
/// how the file adapters detect corruption. The derive would normally fill
/// `None` for an absent `Option` field, so `expiration` carries an explicit
/// `deserialize_with` to keep the field required: absence is a
/// `missing field` error, only a present `null` maps to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: Value,
    #[serde(deserialize_with = "Option::deserialize")]
    pub expiration: Option<i64>,
}

impl StoredEntry {
    pub fn new(value: Value, expiration: Option<i64>) -> Self {
        Self { value, expiration }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        self.expiration.is_some_and(|at| now_ts() >= at)
    }
}

/// Current Unix timestamp in seconds
pub fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}
