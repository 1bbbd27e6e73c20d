//! Cache-first and network-first strategies.
//!
//! Cache-first never fails towards the caller: every error path ends in a
//! placeholder, an offline document or a synthesized 503. Network-first
//! masks failures only for documents; other requests see the network error.

use std::sync::Arc;

use swcache_core::{Destination, Error, Partition, Request, Response};

use super::ServiceWorker;
use super::policy::{OFFLINE_DOCUMENT, OFFLINE_MESSAGE, PLACEHOLDER_IMAGE};

/// The 503 returned when nothing cached can stand in for a failed request.
pub fn offline_response() -> Response {
    Response::new(503, OFFLINE_MESSAGE)
        .with_status_text("Service Unavailable")
        .with_header("content-type", "text/plain; charset=utf-8")
}

impl ServiceWorker {
    /// Serve from `partition` when present, revalidating in the background;
    /// otherwise fetch and store.
    pub async fn cache_first(&self, request: &Request, partition: &str) -> Response {
        match self.try_cache_first(request, partition).await {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(url = %request.url, error = %error, "cache first failed");
                self.fallback(request).await
            }
        }
    }

    async fn try_cache_first(&self, request: &Request, name: &str) -> Result<Response, Error> {
        let partition = self.storage.open(name).await?;
        let key = request.key();

        if let Some(cached) = partition.get(&key).await? {
            tracing::debug!(url = %request.url, partition = name, "serving from cache");
            self.spawn_revalidation(partition, request.clone());
            return Ok(cached);
        }

        tracing::debug!(url = %request.url, "fetching from network");
        let response = self.network.fetch(request).await?;

        if response.ok()
            && let Err(error) = partition.put(key, response.clone()).await
        {
            tracing::warn!(url = %request.url, partition = name, error = %error, "failed to store response");
        }

        Ok(response)
    }

    /// Try the network, store successes, fall back to the partition.
    ///
    /// # Errors
    ///
    /// Returns the network error when the fetch fails, nothing is cached for
    /// the request, and the request is not a document. A failed cache lookup
    /// counts as nothing cached.
    pub async fn network_first(&self, request: &Request, name: &str) -> Result<Response, Error> {
        tracing::debug!(url = %request.url, "fetching from network");

        let error = match self.network.fetch(request).await {
            Ok(response) => {
                if response.ok() {
                    self.store(name, request, &response).await;
                }
                return Ok(response);
            }
            Err(error) => error,
        };

        tracing::info!(url = %request.url, error = %error, "network failed, trying cache");
        match self.lookup(name, request).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(lookup) => {
                tracing::warn!(url = %request.url, partition = name, error = %lookup, "cache lookup failed");
            }
        }

        if request.destination == Destination::Document {
            return Ok(self.fallback(request).await);
        }

        Err(error)
    }

    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        self.storage.open(name).await?.get(&request.key()).await
    }

    async fn store(&self, name: &str, request: &Request, response: &Response) {
        let result = match self.storage.open(name).await {
            Ok(partition) => partition.put(request.key(), response.clone()).await,
            Err(error) => Err(error),
        };
        if let Err(error) = result {
            tracing::warn!(url = %request.url, partition = name, error = %error, "failed to store response");
        }
    }

    /// Fire-and-forget refresh of a cached entry. Not awaited by the caller;
    /// failures are only logged.
    fn spawn_revalidation(&self, partition: Arc<dyn Partition>, request: Request) {
        let network = self.network.clone();
        tokio::spawn(async move {
            match network.fetch(&request).await {
                Ok(response) if response.ok() => match partition.put(request.key(), response).await {
                    Ok(()) => tracing::debug!(url = %request.url, "cache updated in background"),
                    Err(error) => tracing::debug!(url = %request.url, error = %error, "background cache write failed"),
                },
                Ok(response) => {
                    tracing::debug!(url = %request.url, status = response.status, "background refresh not OK; kept cached copy")
                }
                Err(error) => tracing::debug!(url = %request.url, error = %error, "background cache update failed"),
            }
        });
    }

    /// Placeholder for images, offline document otherwise, 503 as last resort.
    async fn fallback(&self, request: &Request) -> Response {
        let path = if request.destination == Destination::Image { PLACEHOLDER_IMAGE } else { OFFLINE_DOCUMENT };

        let lookup = match self.resolve(path) {
            Ok(fallback) => self.storage.match_any(&fallback.key()).await,
            Err(error) => Err(error),
        };

        match lookup {
            Ok(Some(response)) => response,
            Ok(None) => {
                tracing::debug!(url = %request.url, fallback = path, "no cached fallback; synthesizing offline response");
                offline_response()
            }
            Err(error) => {
                tracing::warn!(url = %request.url, error = %error, "fallback lookup failed");
                offline_response()
            }
        }
    }
}
