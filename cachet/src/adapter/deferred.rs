use crate::core::CacheItem;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Per-adapter staging area for deferred saves.
///
/// Process-local and non-persistent: staged items live only in memory until
/// [`drain`](Self::drain) hands them to the adapter's `commit`. Staging the
/// same key twice keeps only the later item.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    items: Mutex<HashMap<String, CacheItem>>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self, item: CacheItem) {
        self.items.lock().insert(item.key().to_string(), item);
    }

    /// Take all staged items, leaving the queue empty
    pub fn drain(&self) -> Vec<CacheItem> {
        self.items.lock().drain().map(|(_, item)| item).collect()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}
