//! Install, activate and bounded eviction.

use futures::future::try_join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheStorage, Error};

use super::policy::{CURRENT_CACHES, EVICTION_LIMITS, PRECACHE_MANIFEST, STATIC_CACHE};
use super::{ServiceWorker, WorkerState};

/// Result of a successful install.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct InstallReport {
    /// Entries written to the static partition.
    pub cached: usize,
    pub skip_waiting: bool,
}

/// Result of activation.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ActivationReport {
    /// Partitions from older deployments that were removed.
    pub deleted: Vec<String>,
    pub clients_claimed: bool,
}

/// Entries removed from one partition by eviction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct PartitionEviction {
    pub partition: String,
    pub max_items: usize,
    pub removed: usize,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct EvictionReport {
    pub partitions: Vec<PartitionEviction>,
}

impl EvictionReport {
    pub fn total_removed(&self) -> usize {
        self.partitions.iter().map(|p| p.removed).sum()
    }
}

/// Messages the worker acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    #[serde(rename = "CLEAN_CACHE")]
    CleanCache,
}

impl ControlMessage {
    /// `None` for anything that is not a recognized `{ "type": ... }` object.
    pub fn parse(data: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(data.clone()).ok()
    }
}

/// Delete the oldest keys of `name` until at most `max_items` remain.
/// Returns how many were deleted.
pub async fn limit_cache_size(storage: &dyn CacheStorage, name: &str, max_items: usize) -> Result<usize, Error> {
    let partition = storage.open(name).await?;
    let keys = partition.keys().await?;

    if keys.len() <= max_items {
        return Ok(0);
    }

    let excess = &keys[..keys.len() - max_items];
    try_join_all(excess.iter().map(|key| partition.delete(key))).await?;

    tracing::info!(partition = name, removed = excess.len(), "cleaned items from cache");
    Ok(excess.len())
}

impl ServiceWorker {
    /// Pre-cache the manifest into the static partition.
    ///
    /// All-or-nothing: every manifest fetch must succeed with an OK status
    /// before anything is stored, and the manifest is written as one batch.
    /// On failure the worker becomes redundant and never activates. A
    /// redundant worker may be installed again.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        {
            let mut status = self.status.write().await;
            if !matches!(status.state, WorkerState::Parsed | WorkerState::Redundant) {
                return Err(Error::InvalidState(format!("cannot install from {:?}", status.state)));
            }
            status.state = WorkerState::Installing;
        }
        tracing::info!("Installing");

        match self.precache().await {
            Ok(cached) => {
                let mut status = self.status.write().await;
                status.state = WorkerState::Installed;
                status.skip_waiting = true;
                tracing::info!(cached, "Installation complete");
                Ok(InstallReport { cached, skip_waiting: true })
            }
            Err(error) => {
                self.status.write().await.state = WorkerState::Redundant;
                tracing::error!(error = %error, "Installation failed");
                Err(match error {
                    failed @ Error::InstallFailed(_) => failed,
                    other => Error::InstallFailed(other.to_string()),
                })
            }
        }
    }

    async fn precache(&self) -> Result<usize, Error> {
        let partition = self.storage.open(STATIC_CACHE).await?;
        tracing::info!(partition = STATIC_CACHE, assets = PRECACHE_MANIFEST.len(), "Caching static assets");

        let requests = PRECACHE_MANIFEST
            .iter()
            .map(|path| self.resolve(path))
            .collect::<Result<Vec<_>, _>>()?;

        let responses = try_join_all(requests.iter().map(|request| async move {
            let response = self.network.fetch(request).await?;
            if !response.ok() {
                return Err(Error::InstallFailed(format!("{} returned {}", request.url, response.status)));
            }
            Ok((request.key(), response))
        }))
        .await?;

        let cached = responses.len();
        partition.put_all(responses).await?;
        Ok(cached)
    }

    /// Remove partitions of older deployments, then claim clients.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        {
            let mut status = self.status.write().await;
            if status.state != WorkerState::Installed {
                return Err(Error::InvalidState(format!("cannot activate from {:?}", status.state)));
            }
            status.state = WorkerState::Activating;
        }
        tracing::info!("Activating");

        let deleted = match self.delete_stale_partitions().await {
            Ok(deleted) => deleted,
            Err(error) => {
                self.status.write().await.state = WorkerState::Installed;
                tracing::error!(error = %error, "Activation failed");
                return Err(error);
            }
        };

        {
            let mut status = self.status.write().await;
            status.state = WorkerState::Activated;
            status.controlling = true;
        }
        tracing::info!(deleted = deleted.len(), "Activation complete");

        Ok(ActivationReport { deleted, clients_claimed: true })
    }

    async fn delete_stale_partitions(&self) -> Result<Vec<String>, Error> {
        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| !CURRENT_CACHES.contains(&name.as_str()))
            .collect();

        let results = try_join_all(stale.iter().map(|name| async move {
            tracing::info!(partition = %name, "Deleting old cache");
            self.storage.delete(name).await
        }))
        .await?;

        Ok(stale.into_iter().zip(results).filter_map(|(name, existed)| existed.then_some(name)).collect())
    }

    /// Prune the dynamic and image partitions to their limits.
    pub async fn clean_cache(&self) -> Result<EvictionReport, Error> {
        let removed = try_join_all(
            EVICTION_LIMITS
                .iter()
                .map(|(name, max_items)| limit_cache_size(self.storage.as_ref(), name, *max_items)),
        )
        .await?;

        let partitions = EVICTION_LIMITS
            .iter()
            .zip(removed)
            .map(|((name, max_items), removed)| PartitionEviction {
                partition: name.to_string(),
                max_items: *max_items,
                removed,
            })
            .collect();

        Ok(EvictionReport { partitions })
    }
}
