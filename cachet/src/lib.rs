//! Cache item abstraction with interchangeable storage backends.
//!
//! A [`CacheItem`] bundles a key, a value and an optional absolute
//! expiration. [`StorageAdapter`] is the uniform contract over a backing
//! store, implemented for in-memory, single-file, per-key-file, Redis and
//! Memcached backends. A [`CacheManager`] holds a named registry of adapters
//! and delegates to the active one.

pub mod adapter;
pub mod config;
pub mod core;
pub mod manager;

// Re-export commonly used types
pub use adapter::{
    DeferredQueue, MemcachedAdapter, MemoryAdapter, PerKeyFileAdapter, RedisAdapter,
    SingleFileAdapter, StorageAdapter,
};
pub use config::{AdapterConfig, CacheConfig};
pub use core::{CacheError, CacheItem, Result, StoredEntry};
pub use manager::{CacheManager, DEFAULT_ADAPTER};
