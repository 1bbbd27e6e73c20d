//! cache_inspect tool implementation.
//!
//! Lists partitions, or the entries of one partition oldest first.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::CacheStorage;

use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the cache_inspect tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheInspectParams {
    /// Partition to list. Omit to list partition names.
    #[serde(default)]
    pub partition: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PartitionSummary {
    pub name: String,
    pub entries: usize,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct EntrySummary {
    pub method: String,
    pub url: String,
    pub status: Option<u16>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum CacheInspectOutput {
    Partitions { partitions: Vec<PartitionSummary> },
    Entries { partition: String, entries: Vec<EntrySummary> },
}

/// Implementation of the cache_inspect tool.
pub async fn inspect_impl(storage: &dyn CacheStorage, params: CacheInspectParams) -> Result<CallToolResult, McpError> {
    let output = match params.partition {
        None => {
            let mut partitions = Vec::new();
            for name in storage.keys().await? {
                let entries = storage.open(&name).await?.len().await?;
                partitions.push(PartitionSummary { name, entries });
            }
            CacheInspectOutput::Partitions { partitions }
        }
        Some(name) => {
            if !storage.has(&name).await? {
                return Err(ToolError::InvalidParams(format!("no such partition: {name}")).into());
            }
            let partition = storage.open(&name).await?;
            let mut entries = Vec::new();
            for key in partition.keys().await? {
                let status = partition.get(&key).await?.map(|r| r.status);
                entries.push(EntrySummary { method: key.method, url: key.url, status });
            }
            CacheInspectOutput::Entries { partition: name, entries }
        }
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::result_json;
    use swcache_core::{CacheDb, MemoryStorage, Request, Response};

    async fn seeded(storage: &dyn CacheStorage) {
        let partition = storage.open("dynamic-v1").await.unwrap();
        for path in ["/news/", "/api/news"] {
            let request = Request::get(format!("https://game.example{path}").parse().unwrap());
            partition.put(request.key(), Response::new(200, "x")).await.unwrap();
        }
        storage.open("images-v1").await.unwrap();
    }

    #[tokio::test]
    async fn test_inspect_lists_partitions() {
        let storage = MemoryStorage::new();
        seeded(&storage).await;

        let output = result_json(&inspect_impl(&storage, CacheInspectParams::default()).await.unwrap());
        assert_eq!(output["partitions"][0]["name"], "dynamic-v1");
        assert_eq!(output["partitions"][0]["entries"], 2);
        assert_eq!(output["partitions"][1]["entries"], 0);
    }

    #[tokio::test]
    async fn test_inspect_partition_entries_in_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        seeded(&db).await;

        let params = CacheInspectParams { partition: Some("dynamic-v1".into()) };
        let output = result_json(&inspect_impl(&db, params).await.unwrap());
        assert_eq!(output["entries"][0]["url"], "https://game.example/news/");
        assert_eq!(output["entries"][1]["url"], "https://game.example/api/news");
        assert_eq!(output["entries"][1]["status"], 200);
    }

    #[tokio::test]
    async fn test_inspect_unknown_partition() {
        let storage = MemoryStorage::new();
        let params = CacheInspectParams { partition: Some("static-v0".into()) };
        let err = inspect_impl(&storage, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
        assert!(!storage.has("static-v0").await.unwrap());
    }
}
