//! In-memory cache storage.
//!
//! Partitions are vectors guarded by tokio `RwLock`s. Deleting a partition
//! detaches it from the storage; handles opened earlier keep working on the
//! detached copy, matching the platform's `caches.delete` behavior.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheStorage, Partition};
use crate::Error;
use crate::http::{RequestKey, Response};

/// One in-memory partition.
pub struct MemoryPartition {
    name: String,
    entries: RwLock<Vec<(RequestKey, Response)>>,
}

impl MemoryPartition {
    fn new(name: &str) -> Self {
        Self { name: name.to_string(), entries: RwLock::new(Vec::new()) }
    }
}

#[async_trait]
impl Partition for MemoryPartition {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        let entries = self.entries.read().await;
        Ok(entries.iter().find(|(k, _)| k == key).map(|(_, r)| r.clone()))
    }

    async fn put(&self, key: RequestKey, response: Response) -> Result<(), Error> {
        let mut entries = self.entries.write().await;
        entries.retain(|(k, _)| *k != key);
        entries.push((key, response));
        Ok(())
    }

    async fn put_all(&self, batch: Vec<(RequestKey, Response)>) -> Result<(), Error> {
        let mut entries = self.entries.write().await;
        for (key, response) in batch {
            entries.retain(|(k, _)| *k != key);
            entries.push((key, response));
        }
        Ok(())
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool, Error> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|(k, _)| k != key);
        Ok(entries.len() != before)
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        let entries = self.entries.read().await;
        Ok(entries.iter().map(|(k, _)| k.clone()).collect())
    }

    async fn len(&self) -> Result<usize, Error> {
        Ok(self.entries.read().await.len())
    }
}

/// Process-local cache storage.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    partitions: Arc<RwLock<Vec<Arc<MemoryPartition>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn Partition>, Error> {
        {
            let partitions = self.partitions.read().await;
            if let Some(p) = partitions.iter().find(|p| p.name == name) {
                return Ok(p.clone());
            }
        }

        let mut partitions = self.partitions.write().await;
        // another task may have created it between the two locks
        if let Some(p) = partitions.iter().find(|p| p.name == name) {
            return Ok(p.clone());
        }
        let partition = Arc::new(MemoryPartition::new(name));
        partitions.push(partition.clone());
        tracing::debug!(partition = name, "created partition");
        Ok(partition)
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        Ok(self.partitions.read().await.iter().any(|p| p.name == name))
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let mut partitions = self.partitions.write().await;
        let before = partitions.len();
        partitions.retain(|p| p.name != name);
        Ok(partitions.len() != before)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.partitions.read().await.iter().map(|p| p.name.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::get(&Url::parse("https://game.example").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_open_creates_once() {
        let storage = MemoryStorage::new();
        let a = storage.open("static-v1").await.unwrap();
        a.put(key("/css/main.css"), Response::new(200, "body")).await.unwrap();

        let b = storage.open("static-v1").await.unwrap();
        assert_eq!(b.len().await.unwrap(), 1);
        assert_eq!(storage.keys().await.unwrap(), vec!["static-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_keys_in_insertion_order() {
        let storage = MemoryStorage::new();
        let p = storage.open("dynamic-v1").await.unwrap();
        for path in ["/a", "/b", "/c"] {
            p.put(key(path), Response::new(200, path)).await.unwrap();
        }
        p.put(key("/a"), Response::new(200, "again")).await.unwrap();

        let keys = p.keys().await.unwrap();
        let urls: Vec<_> = keys.iter().map(|k| k.url.as_str()).collect();
        assert_eq!(urls, ["https://game.example/b", "https://game.example/c", "https://game.example/a"]);
        assert_eq!(p.get(&key("/a")).await.unwrap().unwrap().body, "again");
    }

    #[tokio::test]
    async fn test_put_all_keeps_batch_order() {
        let storage = MemoryStorage::new();
        let p = storage.open("static-v1").await.unwrap();
        p.put(key("/b"), Response::new(200, "old")).await.unwrap();

        let batch = ["/a", "/b", "/c"].map(|path| (key(path), Response::new(200, path))).to_vec();
        p.put_all(batch).await.unwrap();

        let urls: Vec<_> = p.keys().await.unwrap().into_iter().map(|k| k.url).collect();
        assert_eq!(urls, ["https://game.example/a", "https://game.example/b", "https://game.example/c"]);
        assert_eq!(p.get(&key("/b")).await.unwrap().unwrap().body, "/b");
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let storage = MemoryStorage::new();
        let p = storage.open("images-v1").await.unwrap();
        p.put(key("/images/hero.png"), Response::new(200, "png")).await.unwrap();

        assert!(p.delete(&key("/images/hero.png")).await.unwrap());
        assert!(!p.delete(&key("/images/hero.png")).await.unwrap());
        assert!(p.get(&key("/images/hero.png")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_partition() {
        let storage = MemoryStorage::new();
        storage.open("static-v0").await.unwrap();
        storage.open("static-v1").await.unwrap();

        assert!(storage.delete("static-v0").await.unwrap());
        assert!(!storage.has("static-v0").await.unwrap());
        assert_eq!(storage.keys().await.unwrap(), vec!["static-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_match_any_searches_creation_order() {
        let storage = MemoryStorage::new();
        let first = storage.open("static-v1").await.unwrap();
        let second = storage.open("dynamic-v1").await.unwrap();
        second.put(key("/offline.html"), Response::new(200, "second")).await.unwrap();
        first.put(key("/offline.html"), Response::new(200, "first")).await.unwrap();

        let found = storage.match_any(&key("/offline.html")).await.unwrap().unwrap();
        assert_eq!(found.body, "first");
        assert!(storage.match_any(&key("/missing")).await.unwrap().is_none());
    }
}
