//! Cache storage port and its backends.
//!
//! The worker never touches a concrete store. It talks to a [`CacheStorage`]
//! (the `caches` object of the platform) which hands out named
//! [`Partition`]s. Two backends implement the port:
//!
//! - [`MemoryStorage`]: process-local, used by tests and ephemeral hosts
//! - [`CacheDb`]: SQLite via tokio-rusqlite with versioned migrations
//!
//! Both keep keys in insertion order, which is what "oldest" means for
//! bounded eviction.

use std::sync::Arc;

use async_trait::async_trait;

use crate::http::{RequestKey, Response};

pub mod connection;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod partitions;

pub use crate::Error;

pub use connection::CacheDb;
pub use memory::MemoryStorage;
pub use partitions::SqlitePartition;

/// A named key-value store of request keys to response snapshots.
#[async_trait]
pub trait Partition: Send + Sync {
    /// Name this partition was opened under.
    fn name(&self) -> &str;

    /// Look up the stored response for `key`.
    async fn get(&self, key: &RequestKey) -> Result<Option<Response>, Error>;

    /// Store `response` under `key`, replacing any previous entry. The entry
    /// becomes the newest in key order.
    async fn put(&self, key: RequestKey, response: Response) -> Result<(), Error>;

    /// Store every entry or none of them, in order.
    ///
    /// The default writes one entry at a time and deletes the keys it wrote
    /// when a write fails. Entries those keys replaced are not restored.
    async fn put_all(&self, entries: Vec<(RequestKey, Response)>) -> Result<(), Error> {
        let mut written = Vec::with_capacity(entries.len());
        for (key, response) in entries {
            if let Err(error) = self.put(key.clone(), response).await {
                for key in &written {
                    if let Err(cleanup) = self.delete(key).await {
                        tracing::warn!(partition = self.name(), key = %key, error = %cleanup, "rollback delete failed");
                    }
                }
                return Err(error);
            }
            written.push(key);
        }
        Ok(())
    }

    /// Remove the entry for `key`. Returns whether an entry existed.
    async fn delete(&self, key: &RequestKey) -> Result<bool, Error>;

    /// All keys, oldest first.
    async fn keys(&self) -> Result<Vec<RequestKey>, Error>;

    async fn len(&self) -> Result<usize, Error> {
        Ok(self.keys().await?.len())
    }
}

/// The set of partitions visible to one origin.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a partition, creating it on first use.
    async fn open(&self, name: &str) -> Result<Arc<dyn Partition>, Error>;

    /// Whether a partition with this name exists.
    async fn has(&self, name: &str) -> Result<bool, Error>;

    /// Delete a partition and all of its entries. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Partition names in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Search every partition, in creation order, for `key`.
    async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        for name in self.keys().await? {
            let partition = self.open(&name).await?;
            if let Some(response) = partition.get(key).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}
