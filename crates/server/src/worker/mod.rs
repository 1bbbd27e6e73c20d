//! The service worker: lifecycle, fetch interception and push handling.
//!
//! The worker is driven by discrete [`WorkerEvent`]s and answers each with a
//! [`WorkerAction`] describing what the host should do. Cache storage and the
//! network are injected ports, so the same worker runs against SQLite and
//! reqwest in the binary and against in-memory fakes in tests.
//!
//! ```text
//! WorkerEvent::Fetch ─► dispatch ─► classify ─► route
//!                                                 ├─► cache_first   (static, images)
//!                                                 └─► network_first (html, api, default)
//! ```

pub mod classify;
pub mod dispatch;
pub mod lifecycle;
pub mod policy;
pub mod push;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use swcache_client::Network;
use swcache_core::{CacheStorage, Error, Request};
use tokio::sync::RwLock;
use url::Url;

pub use classify::ResourceClass;
pub use dispatch::{FetchOutcome, PassthroughReason};
pub use lifecycle::{ActivationReport, ControlMessage, EvictionReport, InstallReport};
pub use push::Notification;

/// Lifecycle state of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Script evaluated, install not yet attempted.
    #[default]
    Parsed,
    Installing,
    /// Installed and waiting for activation.
    Installed,
    Activating,
    /// Active and controlling clients.
    Activated,
    /// Install failed; this version never takes over.
    Redundant,
}

/// Snapshot of the worker's lifecycle flags.
#[derive(Debug, Clone, Copy, Default, Serialize, schemars::JsonSchema)]
pub struct WorkerStatus {
    pub state: WorkerState,
    /// Set once install succeeds; activation proceeds without waiting for
    /// old clients to close.
    pub skip_waiting: bool,
    /// Set once activation has claimed the open clients.
    pub controlling: bool,
}

/// Inputs the host delivers to the worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Message(serde_json::Value),
    Push(Option<Bytes>),
    NotificationClick { action: Option<String> },
}

/// What the host should do in response to an event.
#[derive(Debug, Clone)]
pub enum WorkerAction {
    Installed(InstallReport),
    Activated(ActivationReport),
    Fetch(FetchOutcome),
    Cleaned(EvictionReport),
    ShowNotification(Notification),
    OpenWindow(String),
    None,
}

/// A service worker bound to one origin.
///
/// Cheap to clone; clones share storage, network and lifecycle state.
#[derive(Clone)]
pub struct ServiceWorker {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    origin: Url,
    status: Arc<RwLock<WorkerStatus>>,
}

impl ServiceWorker {
    pub fn new(storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>, origin: Url) -> Self {
        Self { storage, network, origin, status: Arc::new(RwLock::new(WorkerStatus::default())) }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    pub async fn status(&self) -> WorkerStatus {
        *self.status.read().await
    }

    /// Build a GET request for a same-origin path.
    pub fn resolve(&self, path: &str) -> Result<Request, Error> {
        let url = self
            .origin
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
        Ok(Request::get(url))
    }

    /// Deliver one event.
    pub async fn handle(&self, event: WorkerEvent) -> Result<WorkerAction, Error> {
        match event {
            WorkerEvent::Install => self.install().await.map(WorkerAction::Installed),
            WorkerEvent::Activate => self.activate().await.map(WorkerAction::Activated),
            WorkerEvent::Fetch(request) => self.handle_fetch(request).await.map(WorkerAction::Fetch),
            WorkerEvent::Message(data) => match ControlMessage::parse(&data) {
                Some(ControlMessage::CleanCache) => self.clean_cache().await.map(WorkerAction::Cleaned),
                None => {
                    tracing::debug!(message = %data, "ignoring unrecognized message");
                    Ok(WorkerAction::None)
                }
            },
            WorkerEvent::Push(data) => Ok(push::notification_from_push(data.as_deref())?
                .map(WorkerAction::ShowNotification)
                .unwrap_or(WorkerAction::None)),
            WorkerEvent::NotificationClick { action } => Ok(push::notification_click(action.as_deref())
                .map(|path| WorkerAction::OpenWindow(path.to_string()))
                .unwrap_or(WorkerAction::None)),
        }
    }
}
