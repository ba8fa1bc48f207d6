use thiserror::Error;

/// Main error type for cachet operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Adapter already registered: {0}")]
    AdapterExists(String),

    #[error("Unknown adapter: {0}")]
    UnknownAdapter(String),

    #[error("Cache initialization failed: {0}")]
    Init(String),

    #[error("Backend connection failed: {0}")]
    Connection(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for cachet operations
pub type Result<T> = std::result::Result<T, CacheError>;
