//! Fetch interception: decide whether to handle a request and which strategy
//! answers it.

use schemars::JsonSchema;
use serde::Serialize;
use swcache_client::same_origin;
use swcache_core::{Error, Request, Response};

use super::ServiceWorker;
use super::classify::{ResourceClass, classify};
use super::policy::{Strategy, route};

/// Why a request was left to the platform's default handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PassthroughReason {
    /// The worker has not activated and claimed clients yet.
    NotControlling,
    CrossOrigin,
    NonGet,
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Not intercepted; the host performs the request itself.
    Passthrough(PassthroughReason),
    /// Answered by the worker.
    Respond { class: ResourceClass, response: Response },
}

impl ServiceWorker {
    /// Intercept one request.
    ///
    /// Cross-origin and non-GET requests are never touched, so they are not
    /// cached and never see a fallback.
    pub async fn handle_fetch(&self, request: Request) -> Result<FetchOutcome, Error> {
        if !self.status().await.controlling {
            return Ok(FetchOutcome::Passthrough(PassthroughReason::NotControlling));
        }
        if !same_origin(&request.url, &self.origin) {
            tracing::trace!(url = %request.url, "cross-origin request passed through");
            return Ok(FetchOutcome::Passthrough(PassthroughReason::CrossOrigin));
        }
        if !request.is_get() {
            tracing::trace!(url = %request.url, method = %request.method, "non-GET request passed through");
            return Ok(FetchOutcome::Passthrough(PassthroughReason::NonGet));
        }

        let class = classify(request.url.as_str());
        let target = route(class);
        tracing::debug!(
            url = %request.url,
            destination = request.destination.as_str(),
            ?class,
            partition = target.partition,
            "intercepted fetch"
        );

        let response = match target.strategy {
            Strategy::CacheFirst => self.cache_first(&request, target.partition).await,
            Strategy::NetworkFirst => self.network_first(&request, target.partition).await?,
        };

        Ok(FetchOutcome::Respond { class, response })
    }
}
