//! vg-store: read-once audio object store for voicegate
//!
//! The pipeline writes each synthesized reply under a per-message key; the
//! audio endpoint claims it exactly once. A claimed key observes `None` on
//! every later attempt, so an already-served media link can never be
//! replayed.
//!
//! Two backends:
//!
//! - [`MemoryStore`]: in-process map, the default
//! - [`DiskStore`]: spool directory, survives a restart window

pub mod disk;
pub mod error;
pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;

pub use disk::DiskStore;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;

/// Transient object store keyed by opaque per-message paths.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `key`, overwriting any existing object.
    async fn put(&self, key: &str, bytes: Bytes) -> Result<()>;

    /// Claim the object under `key`: return its bytes and remove the key
    /// from the live keyspace so any later claim observes `None`.
    ///
    /// Backing cleanup (e.g., file removal) is scheduled as a detached
    /// task; callers never wait on it. An absent key is a normal outcome,
    /// not an error.
    async fn take(&self, key: &str) -> Result<Option<Bytes>>;

    /// Best-effort removal of `key` and its backing object.
    async fn delete(&self, key: &str) -> Result<()>;
}
