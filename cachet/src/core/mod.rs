pub mod error;
pub mod item;
pub mod types;

pub use error::{CacheError, Result};
pub use item::CacheItem;
pub use types::{StoredEntry, now_ts};
