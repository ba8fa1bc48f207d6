use super::{DeferredQueue, StorageAdapter};
use crate::core::{CacheError, CacheItem, Result, StoredEntry};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Adapter keeping every item of its namespace in a single JSON file.
///
/// The file holds a serialized `key -> {value, expiration}` mapping. The full
/// mapping is mirrored in memory and re-read before lookups, so concurrent
/// processes sharing the file observe each other's committed writes. Every
/// mutation rewrites the whole file under an exclusive advisory lock, which
/// bounds this adapter to small-to-moderate item counts.
///
/// Corruption is handled fail-closed: if the file does not deserialize to a
/// mapping of well-formed records, the entire cache is discarded and the
/// adapter starts from empty. One bad record invalidates the whole file.
///
/// Reads take no lock, so a reader racing a writer in another process may
/// observe a truncated file; that read is then treated as corruption.
pub struct SingleFileAdapter {
    path: PathBuf,
    data: RwLock<HashMap<String, StoredEntry>>,
    deferred: DeferredQueue,
}

impl SingleFileAdapter {
    /// Open or create the cache file at `path`.
    ///
    /// A missing file is created holding an empty mapping; failure to create
    /// it is fatal and no adapter is returned.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            fs::write(&path, b"{}").map_err(|e| {
                CacheError::Init(format!("cannot create cache file {}: {}", path.display(), e))
            })?;
            info!("Created cache file {}", path.display());
        }

        let adapter = Self {
            path,
            data: RwLock::new(HashMap::new()),
            deferred: DeferredQueue::new(),
        };
        adapter.load();
        Ok(adapter)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the whole file into the in-memory mirror.
    ///
    /// Any failure (unreadable file, top level not a mapping, a record
    /// missing a field) discards the entire cache.
    fn load(&self) {
        let map = match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str::<HashMap<String, StoredEntry>>(&contents) {
                Ok(map) => map,
                Err(e) => {
                    warn!(
                        "Corrupt cache file {}, discarding all entries: {}",
                        self.path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(e) => {
                warn!("Cannot read cache file {}: {}", self.path.display(), e);
                HashMap::new()
            }
        };

        *self.data.write() = map;
    }

    /// Serialize the mirror and rewrite the file under an exclusive lock.
    ///
    /// The lock blocks until acquired; concurrent writers serialize. The
    /// handle is closed on every path, so a failed write never leaves the
    /// file locked.
    fn persist(&self) -> bool {
        let payload = {
            let data = self.data.read();
            match serde_json::to_vec(&*data) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Cannot serialize cache mapping: {}", e);
                    return false;
                }
            }
        };

        // Truncation happens only after the lock is held
        let file = match OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) => {
                warn!("Cannot open cache file {}: {}", self.path.display(), e);
                return false;
            }
        };

        if let Err(e) = file.lock() {
            warn!("Cannot lock cache file {}: {}", self.path.display(), e);
            return false;
        }

        let result = Self::write_locked(&file, &payload);
        // Dropping the handle releases the advisory lock either way
        if let Err(e) = result {
            warn!("Failed to write cache file {}: {}", self.path.display(), e);
            return false;
        }
        true
    }

    fn write_locked(mut file: &File, payload: &[u8]) -> io::Result<()> {
        file.set_len(0)?;
        file.write_all(payload)?;
        file.sync_all()
    }
}

impl StorageAdapter for SingleFileAdapter {
    fn get_item(&self, key: &str) -> CacheItem {
        self.load();

        let entry = {
            let data = self.data.read();
            data.get(key).cloned()
        };

        match entry {
            Some(entry) if entry.is_expired() => {
                debug!("Key expired, purging from file: {}", key);
                self.data.write().remove(key);
                self.persist();
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
        self.persist()
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
        self.load();
        let existed = self.data.write().remove(key).is_some();
        if !existed {
            return false;
        }
        self.persist()
    }

    fn clear(&self) -> bool {
        self.data.write().clear();
        self.persist()
    }

    fn cache_size(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    fn item_count(&self) -> usize {
        self.load();
        self.data.read().len()
    }
}
