//! swcache server entry point.
//!
//! Boots the service worker against the configured cache storage and network,
//! then serves its events as MCP tools on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{FetchClient, FetchConfig};
use swcache_core::{AppConfig, CacheDb, CacheStorage, MemoryStorage, StorageBackend};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;
mod worker;

use worker::ServiceWorker;

async fn open_storage(config: &AppConfig) -> Result<Arc<dyn CacheStorage>> {
    Ok(match config.storage {
        StorageBackend::Sqlite => Arc::new(CacheDb::open(&config.db_path).await?),
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let origin = config.origin_url()?;

    let storage = open_storage(&config).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let worker = ServiceWorker::new(storage, network, origin);

    tracing::info!(origin = %worker.origin(), storage = ?config.storage, "Starting swcache server on stdio transport");

    let handler = handler::SwCacheServer::new(worker);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
