//! Storage Module
//!
//! Durable key-value backends shared by the cache and the offline queue.
//!
//! The backend is assumed crash-safe per single-key operation but not
//! transactional across keys. The cache and the queue isolate themselves
//! from each other (and from anything else sharing the store) through
//! disjoint key namespaces, never through transactions.

mod file;
mod memory;

use async_trait::async_trait;

use crate::error::Result;

pub use file::FileStorage;
pub use memory::MemoryStorage;

// == Storage Backend Trait ==
/// Asynchronous string-keyed durable store.
///
/// All methods may fail with a storage-layer error; callers above this
/// boundary (cache, queue) downgrade failures rather than propagate them.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Returns the stored value for `key`, or None if absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, overwriting any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`. Idempotent; absent keys are not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Deletes every key in `keys`. Not atomic across keys.
    async fn multi_remove(&self, keys: &[String]) -> Result<()>;

    /// Enumerates every key currently present in the store.
    async fn all_keys(&self) -> Result<Vec<String>>;
}
