//! Error types for the data layer
//!
//! Provides unified error handling using thiserror.
//!
//! Nothing in the cache or queue public surface propagates these during
//! normal operation; failed reads degrade to misses and failed writes are
//! logged and swallowed. Storage backends do return them, since callers
//! embedding a backend directly may care about I/O outcomes.

use thiserror::Error;

// == Sync Error Enum ==
/// Unified error type for the data layer.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Underlying storage backend failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem I/O failure (file backend)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Envelope or queue blob failed to (de)serialize
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the data layer.
pub type Result<T> = std::result::Result<T, SyncError>;
