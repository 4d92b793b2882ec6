//! Cache Service Module
//!
//! TTL cache over a durable storage backend with namespaced keys and
//! read-triggered eviction.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::CacheEnvelope;
use crate::config::SyncConfig;
use crate::storage::StorageBackend;

// == Cache Service ==
/// Read-through, write-through cache with per-entry expiry.
///
/// Failures never cross this surface: a failed or corrupt read is a miss,
/// a failed write is a logged no-op. Caching here is an availability
/// optimization, so it must not become a new failure source for callers.
pub struct CacheService {
    storage: Arc<dyn StorageBackend>,
    prefix: String,
    default_ttl_ms: u64,
}

impl CacheService {
    // == Constructor ==
    /// Creates a cache over `storage`, namespaced and configured by `config`.
    pub fn new(storage: Arc<dyn StorageBackend>, config: &SyncConfig) -> Self {
        Self {
            storage,
            prefix: config.cache_prefix.clone(),
            default_ttl_ms: config.cache_default_ttl_ms,
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    // == Get ==
    /// Retrieves a cached value, or None on miss, expiry, or any failure.
    ///
    /// An expired entry is deleted before returning None, so storage is
    /// reclaimed on the first late read (entries nobody reads again are
    /// only reclaimed when overwritten).
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let storage_key = self.namespaced(key);

        let raw = match self.storage.get(&storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read failed for {}: {}", storage_key, e);
                return None;
            }
        };

        let envelope: CacheEnvelope<T> = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                // Left in place; the next successful set overwrites it
                warn!("Corrupt cache entry at {}: {}", storage_key, e);
                return None;
            }
        };

        if envelope.is_expired() {
            debug!("Cache entry expired: {}", storage_key);
            if let Err(e) = self.storage.remove(&storage_key).await {
                warn!("Failed to evict expired entry {}: {}", storage_key, e);
            }
            return None;
        }

        Some(envelope.data)
    }

    // == Set ==
    /// Caches `data` under `key` with the default TTL.
    pub async fn set<T: Serialize>(&self, key: &str, data: &T) {
        self.set_with_ttl(key, data, self.default_ttl_ms).await;
    }

    // == Set With TTL ==
    /// Caches `data` under `key`, expiring `ttl_ms` after now.
    ///
    /// Storage and serialization failures are logged and swallowed.
    pub async fn set_with_ttl<T: Serialize>(&self, key: &str, data: &T, ttl_ms: u64) {
        let storage_key = self.namespaced(key);
        let envelope = CacheEnvelope::new(data, ttl_ms);

        let raw = match serde_json::to_string(&envelope) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize cache entry {}: {}", storage_key, e);
                return;
            }
        };

        if let Err(e) = self.storage.set(&storage_key, &raw).await {
            warn!("Cache write failed for {}: {}", storage_key, e);
        }
    }

    // == Has ==
    /// Checks whether a valid (unexpired, parseable) entry exists for `key`.
    ///
    /// Delegates to `get`, accepting the deserialization cost for the
    /// guarantee that `has` and `get` can never disagree.
    pub async fn has(&self, key: &str) -> bool {
        self.get::<serde_json::Value>(key).await.is_some()
    }

    // == Remove ==
    /// Deletes the entry for `key`. Idempotent; absence is not an error.
    pub async fn remove(&self, key: &str) {
        let storage_key = self.namespaced(key);
        if let Err(e) = self.storage.remove(&storage_key).await {
            warn!("Cache remove failed for {}: {}", storage_key, e);
        }
    }

    // == Clear ==
    /// Deletes every entry under this cache's namespace.
    ///
    /// Keys belonging to other consumers of the shared store are untouched.
    pub async fn clear(&self) {
        let keys = match self.storage.all_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Cache clear failed enumerating keys: {}", e);
                return;
            }
        };

        let owned: Vec<String> = keys
            .into_iter()
            .filter(|k| k.starts_with(&self.prefix))
            .collect();

        if owned.is_empty() {
            return;
        }

        match self.storage.multi_remove(&owned).await {
            Ok(()) => debug!("Cache cleared: {} entries removed", owned.len()),
            Err(e) => warn!("Cache clear failed removing entries: {}", e),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, SyncError};
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use serde::Deserialize;

    fn cache_over(storage: Arc<dyn StorageBackend>) -> CacheService {
        CacheService::new(storage, &SyncConfig::default())
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Verse {
        surah: u32,
        ayah: u32,
        text: String,
    }

    #[tokio::test]
    async fn test_cache_set_and_get() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = cache_over(storage);

        let verse = Verse {
            surah: 2,
            ayah: 255,
            text: "Ayat al-Kursi".to_string(),
        };
        cache.set("verse:2:255", &verse).await;

        let cached: Option<Verse> = cache.get("verse:2:255").await;
        assert_eq!(cached, Some(verse));
    }

    #[tokio::test]
    async fn test_cache_get_missing_is_none() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = cache_over(storage);

        let cached: Option<String> = cache.get("absent").await;
        assert_eq!(cached, None);
    }

    #[tokio::test]
    async fn test_cache_expired_entry_is_evicted_on_read() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = cache_over(storage.clone());

        cache.set_with_ttl("short", &"value", 30).await;
        tokio::time::sleep(std::time::Duration::from_millis(60)).await;

        let cached: Option<String> = cache.get("short").await;
        assert_eq!(cached, None);
        // The late read deleted the entry from the backing store
        assert_eq!(storage.get("cache:short").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cache_has_matches_get() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = cache_over(storage);

        assert!(!cache.has("key").await);
        cache.set("key", &42u32).await;
        assert!(cache.has("key").await);
    }

    #[tokio::test]
    async fn test_cache_remove_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = cache_over(storage);

        cache.set("key", &"value").await;
        cache.remove("key").await;
        cache.remove("key").await;

        assert!(!cache.has("key").await);
    }

    #[tokio::test]
    async fn test_cache_clear_leaves_unrelated_keys() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = cache_over(storage.clone());

        cache.set("a", &1u32).await;
        cache.set("b", &2u32).await;
        // A key owned by another consumer of the same store
        storage.set("offline_queue", "[]").await.unwrap();

        cache.clear().await;

        assert!(!cache.has("a").await);
        assert!(!cache.has("b").await);
        assert_eq!(
            storage.get("offline_queue").await.unwrap(),
            Some("[]".to_string())
        );
    }

    #[tokio::test]
    async fn test_cache_corrupt_entry_is_a_miss() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = cache_over(storage.clone());

        storage.set("cache:bad", "{not json").await.unwrap();

        let cached: Option<String> = cache.get("bad").await;
        assert_eq!(cached, None);
        // Entry stays in place until overwritten
        assert!(storage.get("cache:bad").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cache_type_mismatch_is_a_miss() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = cache_over(storage);

        cache.set("key", &"a string").await;
        let cached: Option<u64> = cache.get("key").await;
        assert_eq!(cached, None);
    }

    // Backend that fails every operation, for degradation tests
    struct FailingStorage;

    #[async_trait]
    impl StorageBackend for FailingStorage {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(SyncError::Storage("disk on fire".to_string()))
        }
        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(SyncError::Storage("disk on fire".to_string()))
        }
        async fn remove(&self, _key: &str) -> Result<()> {
            Err(SyncError::Storage("disk on fire".to_string()))
        }
        async fn multi_remove(&self, _keys: &[String]) -> Result<()> {
            Err(SyncError::Storage("disk on fire".to_string()))
        }
        async fn all_keys(&self) -> Result<Vec<String>> {
            Err(SyncError::Storage("disk on fire".to_string()))
        }
    }

    #[tokio::test]
    async fn test_cache_never_propagates_storage_failures() {
        let cache = cache_over(Arc::new(FailingStorage));

        // Every operation degrades instead of erroring
        cache.set("key", &"value").await;
        let cached: Option<String> = cache.get("key").await;
        assert_eq!(cached, None);
        assert!(!cache.has("key").await);
        cache.remove("key").await;
        cache.clear().await;
    }
}
