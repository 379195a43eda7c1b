//! Disk-backed object store
//!
//! Objects live as files in a spool directory, with a concurrent in-memory
//! index of live keys. The index removal is the atomic claim; the file
//! removal runs as a detached task that the caller never waits on.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::ObjectStore;

/// Spool-directory object store.
#[derive(Debug)]
pub struct DiskStore {
    dir: PathBuf,
    live: DashMap<String, ()>,
}

impl DiskStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// Files already present in the spool are indexed as live objects, so
    /// keys written before a restart stay retrievable.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let live = DashMap::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    live.insert(name.to_string(), ());
                }
            }
        }

        debug!("Opened disk store at {:?}, {} live objects", dir, live.len());

        Ok(Self { dir, live })
    }

    /// Reject keys that could escape the spool directory.
    fn object_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.contains("..")
            || Path::new(key).file_name() != Some(std::ffi::OsStr::new(key))
        {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether the store holds no objects
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

#[async_trait]
impl ObjectStore for DiskStore {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<()> {
        let path = self.object_path(key)?;

        debug!("Storing {} bytes at {:?}", bytes.len(), path);

        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| StoreError::WriteRejected(format!("{}: {}", path.display(), e)))?;

        self.live.insert(key.to_string(), ());
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<Bytes>> {
        let path = self.object_path(key)?;

        // Claiming the index entry is what makes the key read-once; a
        // concurrent or later take on the same key sees None from here on.
        if self.live.remove(key).is_none() {
            return Ok(None);
        }

        let bytes = tokio::fs::read(&path).await?;

        // File cleanup is fire-and-forget; the response is already owed to
        // the caller.
        tokio::spawn(async move {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!("Failed to remove served object {:?}: {}", path, e);
            }
        });

        Ok(Some(Bytes::from(bytes)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.object_path(key)?;
        self.live.remove(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
