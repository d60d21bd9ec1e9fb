use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use super::{KeyValueStore, MemoryStore, StoreKey};

/// Typed facade over a [`KeyValueStore`].
///
/// Mirrors the storage-wrapper contract of the original data layer: `get`
/// never throws (missing keys, backend failures and malformed JSON all read
/// as "no data"), and `set` logs and drops failed writes instead of
/// propagating them. Every write replaces the whole value under its key.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl Storage {
    pub fn new(backend: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    /// Memory-backed storage under the default namespace.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), "microcollab")
    }

    fn storage_key(&self, key: StoreKey) -> String {
        format!("{}:{}", self.namespace, key.as_str())
    }

    pub async fn get<T: DeserializeOwned>(&self, key: StoreKey) -> Option<T> {
        let storage_key = self.storage_key(key);
        let raw = match self.backend.get(&storage_key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read {}: {}", storage_key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Malformed JSON under {}: {}", storage_key, e);
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: StoreKey, value: &T) {
        let storage_key = self.storage_key(key);
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                error!("Failed to serialize value for {}: {}", storage_key, e);
                return;
            }
        };

        if let Err(e) = self.backend.set(&storage_key, raw).await {
            error!("Failed to write {}: {}", storage_key, e);
        }
    }

    pub async fn remove(&self, key: StoreKey) {
        let storage_key = self.storage_key(key);
        if let Err(e) = self.backend.remove(&storage_key).await {
            error!("Failed to remove {}: {}", storage_key, e);
        }
    }

    pub async fn has(&self, key: StoreKey) -> bool {
        let storage_key = self.storage_key(key);
        match self.backend.has(&storage_key).await {
            Ok(present) => present,
            Err(e) => {
                warn!("Failed to check {}: {}", storage_key, e);
                false
            }
        }
    }

    /// Reads the array under `key`, treating a missing or unreadable value
    /// as empty.
    pub async fn load_list<T: DeserializeOwned>(&self, key: StoreKey) -> Vec<T> {
        self.get(key).await.unwrap_or_default()
    }

    pub async fn store_list<T: Serialize>(&self, key: StoreKey, items: &[T]) {
        self.set(key, &items).await;
    }

    /// Removes every well-known key. Used by the dev-only data reset.
    pub async fn clear_all(&self) {
        for key in StoreKey::ALL {
            self.remove(key).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MockKeyValueStore;

    #[tokio::test]
    async fn test_get_returns_none_for_malformed_json() {
        let mut backend = MockKeyValueStore::new();
        backend
            .expect_get()
            .returning(|_| Ok(Some("{ not json".to_string())));

        let storage = Storage::new(Arc::new(backend), "microcollab");
        let value: Option<Vec<u32>> = storage.get(StoreKey::Requests).await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_get_returns_none_on_backend_error() {
        let mut backend = MockKeyValueStore::new();
        backend
            .expect_get()
            .returning(|_| Err(StorageError::Backend("unavailable".to_string())));

        let storage = Storage::new(Arc::new(backend), "microcollab");
        let value: Option<Vec<u32>> = storage.get(StoreKey::Requests).await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_set_swallows_quota_errors() {
        let mut backend = MockKeyValueStore::new();
        backend
            .expect_set()
            .returning(|_, _| Err(StorageError::QuotaExceeded));

        let storage = Storage::new(Arc::new(backend), "microcollab");
        // Must not panic or propagate
        storage.set(StoreKey::Requests, &vec![1u32, 2, 3]).await;
    }

    #[tokio::test]
    async fn test_keys_are_namespaced() {
        let mut backend = MockKeyValueStore::new();
        backend
            .expect_get()
            .withf(|key| key == "microcollab:requests")
            .returning(|_| Ok(Some("[]".to_string())));

        let storage = Storage::new(Arc::new(backend), "microcollab");
        let value: Option<Vec<u32>> = storage.get(StoreKey::Requests).await;
        assert_eq!(value, Some(vec![]));
    }

    #[tokio::test]
    async fn test_list_roundtrip() {
        let storage = Storage::in_memory();

        assert!(storage.load_list::<u32>(StoreKey::Offers).await.is_empty());

        storage.store_list(StoreKey::Offers, &[1u32, 2, 3]).await;
        assert_eq!(storage.load_list::<u32>(StoreKey::Offers).await, vec![1, 2, 3]);

        storage.clear_all().await;
        assert!(!storage.has(StoreKey::Offers).await);
    }
}
