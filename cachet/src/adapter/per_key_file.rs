use super::{DeferredQueue, StorageAdapter};
use crate::core::{CacheError, CacheItem, Result, StoredEntry};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const FILE_SUFFIX: &str = ".cache";

/// Adapter storing one file per key inside a configured directory.
///
/// Filenames are the hex SHA-256 digest of the key plus a fixed suffix, so
/// arbitrary keys map to safe, collision-resistant names. Each file holds a
/// single serialized `{value, expiration}` record.
///
/// No locking is applied to the per-key files: concurrent saves to the same
/// key may race, with the last full write winning non-deterministically.
pub struct PerKeyFileAdapter {
    directory: PathBuf,
    deferred: DeferredQueue,
}

impl PerKeyFileAdapter {
    /// Use `directory` as the cache namespace, creating it recursively if
    /// absent. Failure to create it is fatal.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();

        fs::create_dir_all(&directory).map_err(|e| {
            CacheError::Init(format!(
                "cannot create cache directory {}: {}",
                directory.display(),
                e
            ))
        })?;
        info!("Using cache directory {}", directory.display());

        Ok(Self {
            directory,
            deferred: DeferredQueue::new(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        self.directory.join(format!("{digest}{FILE_SUFFIX}"))
    }

    fn read_entry(&self, key: &str) -> Option<StoredEntry> {
        let path = self.path_for(key);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Cannot read cache file {}: {}", path.display(), e);
                }
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(entry) => Some(entry),
            Err(e) => {
                // Corrupt record: miss for this entry only
                warn!("Corrupt cache file {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl StorageAdapter for PerKeyFileAdapter {
    fn get_item(&self, key: &str) -> CacheItem {
        let Some(entry) = self.read_entry(key) else {
            return CacheItem::miss(key);
        };

        if entry.is_expired() {
            debug!("Key expired, deleting file: {}", key);
            let path = self.path_for(key);
            if let Err(e) = fs::remove_file(&path) {
                warn!("Cannot delete expired cache file {}: {}", path.display(), e);
            }
            return CacheItem::miss(key);
        }

        let mut item = CacheItem::new(key);
        item.set(entry.value).expires_at(entry.expiration);
        item
    }

    fn save(&self, item: &CacheItem) -> bool {
        let value = item.get().cloned().unwrap_or(serde_json::Value::Null);
        let entry = StoredEntry::new(value, item.expiration_time());

        let payload = match serde_json::to_vec(&entry) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Cannot serialize entry for key {}: {}", item.key(), e);
                return false;
            }
        };

        let path = self.path_for(item.key());
        match fs::write(&path, payload) {
            Ok(()) => true,
            Err(e) => {
                warn!("Cannot write cache file {}: {}", path.display(), e);
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
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Cannot delete cache file {}: {}", path.display(), e);
                false
            }
        }
    }

    fn clear(&self) -> bool {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Cannot read cache directory {}: {}",
                    self.directory.display(),
                    e
                );
                return false;
            }
        };

        let mut ok = true;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file()
                && let Err(e) = fs::remove_file(&path)
            {
                warn!("Cannot delete cache file {}: {}", path.display(), e);
                ok = false;
            }
        }
        ok
    }

    fn cache_size(&self) -> u64 {
        let Ok(entries) = fs::read_dir(&self.directory) else {
            return 0;
        };

        entries
            .flatten()
            .filter_map(|entry| entry.metadata().ok())
            .filter(|meta| meta.is_file())
            .map(|meta| meta.len())
            .sum()
    }

    fn item_count(&self) -> usize {
        let Ok(entries) = fs::read_dir(&self.directory) else {
            return 0;
        };

        entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::now_ts;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_creates_directory_recursively() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let adapter = PerKeyFileAdapter::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(adapter.item_count(), 0);
    }

    #[test]
    fn test_filename_is_hex_digest() {
        let dir = tempdir().unwrap();
        let adapter = PerKeyFileAdapter::new(dir.path()).unwrap();

        let mut item = CacheItem::new("some key");
        item.set(json!("v"));
        adapter.save(&item);

        let path = adapter.path_for("some key");
        assert!(path.exists());
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.ends_with(FILE_SUFFIX));
        assert_eq!(name.len(), 64 + FILE_SUFFIX.len());
        assert!(
            name.trim_end_matches(FILE_SUFFIX)
                .chars()
                .all(|c| c.is_ascii_hexdigit())
        );
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let adapter = PerKeyFileAdapter::new(dir.path()).unwrap();

        let mut item = CacheItem::new("k");
        item.set(json!([1, 2, 3])).expires_at(Some(now_ts() + 120));
        assert!(adapter.save(&item));

        let fetched = adapter.get_item("k");
        assert!(fetched.is_hit());
        assert_eq!(fetched.get(), Some(&json!([1, 2, 3])));
        assert_eq!(fetched.expiration_time(), item.expiration_time());
    }

    #[test]
    fn test_expired_entry_file_is_deleted() {
        let dir = tempdir().unwrap();
        let adapter = PerKeyFileAdapter::new(dir.path()).unwrap();

        let mut item = CacheItem::new("k");
        item.set(json!("v")).expires_at(Some(now_ts() - 1));
        adapter.save(&item);
        assert_eq!(adapter.item_count(), 1);

        assert!(!adapter.get_item("k").is_hit());
        assert_eq!(adapter.item_count(), 0);
        assert!(!adapter.path_for("k").exists());
    }

    #[test]
    fn test_corrupt_record_is_a_miss_for_that_entry_only() {
        let dir = tempdir().unwrap();
        let adapter = PerKeyFileAdapter::new(dir.path()).unwrap();

        let mut good = CacheItem::new("good");
        good.set(json!("v"));
        adapter.save(&good);

        fs::write(adapter.path_for("bad"), r#"{"value":"v"}"#).unwrap();

        assert!(!adapter.get_item("bad").is_hit());
        assert!(adapter.get_item("good").is_hit());
    }

    #[test]
    fn test_delete_item() {
        let dir = tempdir().unwrap();
        let adapter = PerKeyFileAdapter::new(dir.path()).unwrap();

        let mut item = CacheItem::new("k");
        item.set(json!("v"));
        adapter.save(&item);

        assert!(adapter.delete_item("k"));
        assert!(!adapter.delete_item("k"));
    }

    #[test]
    fn test_clear_removes_every_file() {
        let dir = tempdir().unwrap();
        let adapter = PerKeyFileAdapter::new(dir.path()).unwrap();

        for key in ["a", "b", "c"] {
            let mut item = CacheItem::new(key);
            item.set(json!(key));
            adapter.save(&item);
        }
        assert_eq!(adapter.item_count(), 3);

        assert!(adapter.clear());
        assert_eq!(adapter.item_count(), 0);
        assert_eq!(adapter.cache_size(), 0);
    }

    #[test]
    fn test_cache_size_sums_file_sizes() {
        let dir = tempdir().unwrap();
        let adapter = PerKeyFileAdapter::new(dir.path()).unwrap();
        assert_eq!(adapter.cache_size(), 0);

        let mut item = CacheItem::new("k");
        item.set(json!("value"));
        adapter.save(&item);

        let expected = fs::metadata(adapter.path_for("k")).unwrap().len();
        assert_eq!(adapter.cache_size(), expected);
    }

    #[test]
    fn test_deferred_commit() {
        let dir = tempdir().unwrap();
        let adapter = PerKeyFileAdapter::new(dir.path()).unwrap();

        let mut item = CacheItem::new("k");
        item.set(json!("v"));
        adapter.save_deferred(&item);
        assert!(!adapter.has_item("k"));

        assert!(adapter.commit());
        assert!(adapter.has_item("k"));
    }
}
