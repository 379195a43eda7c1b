//! In-memory object store

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tracing::debug;

use crate::error::Result;
use crate::ObjectStore;

/// In-process object store backed by a concurrent map.
///
/// Keys are partitioned per message, so no cross-key coordination is
/// needed; `remove` is the atomic claim.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: DashMap<String, Bytes>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<()> {
        debug!("Storing {} bytes under {}", bytes.len(), key);
        self.objects.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.objects.remove(key).map(|(_, bytes)| bytes))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_take() {
        let store = MemoryStore::new();
        store.put("SM1.ogg", Bytes::from_static(b"opus")).await.unwrap();

        let bytes = store.take("SM1.ogg").await.unwrap();
        assert_eq!(bytes, Some(Bytes::from_static(b"opus")));
    }

    #[tokio::test]
    async fn test_take_is_read_once() {
        let store = MemoryStore::new();
        store.put("SM1.ogg", Bytes::from_static(b"opus")).await.unwrap();

        assert!(store.take("SM1.ogg").await.unwrap().is_some());
        assert!(store.take("SM1.ogg").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_take_absent_key() {
        let store = MemoryStore::new();
        assert!(store.take("missing.ogg").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = MemoryStore::new();
        store.put("SM1.ogg", Bytes::from_static(b"old")).await.unwrap();
        store.put("SM1.ogg", Bytes::from_static(b"new")).await.unwrap();

        assert_eq!(
            store.take("SM1.ogg").await.unwrap(),
            Some(Bytes::from_static(b"new"))
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        store.put("SM1.ogg", Bytes::from_static(b"opus")).await.unwrap();
        store.delete("SM1.ogg").await.unwrap();

        assert!(store.take("SM1.ogg").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = MemoryStore::new();
        store.put("SM1.ogg", Bytes::from_static(b"a")).await.unwrap();
        store.put("SM2.ogg", Bytes::from_static(b"b")).await.unwrap();

        assert!(store.take("SM1.ogg").await.unwrap().is_some());
        assert!(store.take("SM2.ogg").await.unwrap().is_some());
        assert_eq!(store.len(), 0);
    }
}
