//! File Storage Backend
//!
//! Durable backend keeping one file per key under a root directory.
//!
//! Filenames are the URL-safe base64 encoding of the key, so arbitrary key
//! strings (including namespace prefixes containing `:`) stay
//! filesystem-safe. Writes go through a temp file and rename, keeping a
//! single-key write crash-safe; there is no atomicity across keys.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, SyncError};
use crate::storage::StorageBackend;

// == File Storage ==
/// Directory-backed durable store.
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Opens (creating if needed) a file store rooted at `root`.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(URL_SAFE_NO_PAD.encode(key))
    }

    fn decode_file_name(name: &str) -> Option<String> {
        let bytes = URL_SAFE_NO_PAD.decode(name).ok()?;
        String::from_utf8(bytes).ok()
    }
}

#[async_trait]
impl StorageBackend for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let encoded = URL_SAFE_NO_PAD.encode(key);
        let path = self.root.join(&encoded);
        // Per-write temp name: concurrent writers of the same key must
        // never share a temp file, or a rename could publish a blob mixing
        // both writes.
        let tmp = self
            .root
            .join(format!("{encoded}.{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn multi_remove(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }

    async fn all_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry
                .file_name()
                .into_string()
                .map_err(|_| SyncError::Storage("non-UTF8 file name in store".to_string()))?;
            // Skip temp files and anything that did not come from this store
            match Self::decode_file_name(&name) {
                Some(key) => keys.push(key),
                None => debug!("Skipping undecodable store file: {}", name),
            }
        }
        Ok(keys)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_set_and_get() {
        let dir = tempdir().unwrap();
        let store = FileStorage::open(dir.path()).await.unwrap();

        store.set("cache:verse:2:255", "ayat").await.unwrap();
        let value = store.get("cache:verse:2:255").await.unwrap();

        assert_eq!(value, Some("ayat".to_string()));
    }

    #[tokio::test]
    async fn test_file_get_missing() {
        let dir = tempdir().unwrap();
        let store = FileStorage::open(dir.path()).await.unwrap();

        assert_eq!(store.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_overwrite() {
        let dir = tempdir().unwrap();
        let store = FileStorage::open(dir.path()).await.unwrap();

        store.set("key", "v1").await.unwrap();
        store.set("key", "v2").await.unwrap();

        assert_eq!(store.get("key").await.unwrap(), Some("v2".to_string()));
    }

    #[tokio::test]
    async fn test_file_concurrent_same_key_writes_stay_intact() {
        let dir = tempdir().unwrap();
        let store = std::sync::Arc::new(FileStorage::open(dir.path()).await.unwrap());

        // Two racing writers of distinct large values; whichever rename
        // lands last must publish its value whole, never a mix of both.
        let a = "a".repeat(64 * 1024);
        let b = "b".repeat(64 * 1024);
        let mut tasks = Vec::new();
        for _ in 0..10 {
            let (store_a, value_a) = (store.clone(), a.clone());
            let (store_b, value_b) = (store.clone(), b.clone());
            tasks.push(tokio::spawn(async move {
                store_a.set("contended", &value_a).await.unwrap();
            }));
            tasks.push(tokio::spawn(async move {
                store_b.set("contended", &value_b).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let value = store.get("contended").await.unwrap().unwrap();
        assert!(value == a || value == b, "stored value is a mix of writes");
        // No temp files left behind for all_keys to trip over
        assert_eq!(store.all_keys().await.unwrap(), vec!["contended".to_string()]);
    }

    #[tokio::test]
    async fn test_file_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileStorage::open(dir.path()).await.unwrap();

        store.set("key", "value").await.unwrap();
        store.remove("key").await.unwrap();
        store.remove("key").await.unwrap();

        assert_eq!(store.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_all_keys_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileStorage::open(dir.path()).await.unwrap();

        store.set("cache:a", "1").await.unwrap();
        store.set("queue/pending", "2").await.unwrap();

        let mut keys = store.all_keys().await.unwrap();
        keys.sort();
        assert_eq!(
            keys,
            vec!["cache:a".to_string(), "queue/pending".to_string()]
        );
    }

    #[tokio::test]
    async fn test_file_all_keys_skips_foreign_files() {
        let dir = tempdir().unwrap();
        let store = FileStorage::open(dir.path()).await.unwrap();

        store.set("key", "value").await.unwrap();
        // A file somebody else dropped into the directory
        std::fs::write(dir.path().join("not base64!"), "junk").unwrap();

        let keys = store.all_keys().await.unwrap();
        assert_eq!(keys, vec!["key".to_string()]);
    }

    #[tokio::test]
    async fn test_file_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = FileStorage::open(dir.path()).await.unwrap();
            store.set("key", "persisted").await.unwrap();
        }

        let store = FileStorage::open(dir.path()).await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some("persisted".to_string()));
    }
}
