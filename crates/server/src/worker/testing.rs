//! Fakes shared by the worker tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use swcache_client::Network;
use swcache_core::{CacheStorage, Error, MemoryStorage, Partition, Request, RequestKey, Response};
use tokio::sync::Semaphore;
use url::Url;

use super::ServiceWorker;
use super::policy::PRECACHE_MANIFEST;

pub const ORIGIN: &str = "https://game.example";

/// Scripted network. Unknown URLs answer 404.
pub struct FakeNetwork {
    origin: Url,
    routes: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    paused: AtomicBool,
    gate: Semaphore,
}

impl FakeNetwork {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            routes: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            paused: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }

    /// Answer `path` with `response`, replacing any earlier route.
    pub fn route(&self, path: &str, response: Response) {
        let url = self.origin.join(path).unwrap();
        let response = response.with_url(url.as_str());
        self.routes.lock().unwrap().insert(url.into(), response);
    }

    /// Answer every manifest path with a 200.
    pub fn serve_manifest(&self) {
        for path in PRECACHE_MANIFEST {
            self.route(path, Response::new(200, format!("asset {path}")).with_status_text("OK"));
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fetches started so far, including ones blocked by [`pause`](Self::pause).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Block subsequent fetches until [`release`](Self::release).
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.paused.load(Ordering::SeqCst) {
            self.gate.acquire().await.unwrap().forget();
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }

        let url = request.key().url;
        let response = self.routes.lock().unwrap().get(&url).cloned();
        Ok(response.unwrap_or_else(|| Response::new(404, "not found").with_status_text("Not Found").with_url(url)))
    }
}

/// In-memory storage whose writes and reads can be made to fail.
///
/// Partitions only override `get` and `put`, so batch writes go through the
/// port's default `put_all`.
#[derive(Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    fail: Arc<FlakyState>,
}

#[derive(Default)]
struct FlakyState {
    puts: AtomicUsize,
    /// 1-based index of the first `put` to fail; 0 disables.
    fail_put_at: AtomicUsize,
    fail_reads: AtomicBool,
}

impl FlakyStorage {
    pub fn fail_put_at(&self, n: usize) {
        self.fail.fail_put_at.store(n, Ordering::SeqCst);
    }

    /// Fail `open` and `get`.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail.fail_reads.store(fail, Ordering::SeqCst);
    }
}

impl FlakyState {
    fn reads_failing(&self) -> Result<(), Error> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::CorruptEntry("storage unavailable".into()));
        }
        Ok(())
    }
}

struct FlakyPartition {
    inner: Arc<dyn Partition>,
    fail: Arc<FlakyState>,
}

#[async_trait]
impl Partition for FlakyPartition {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        self.fail.reads_failing()?;
        self.inner.get(key).await
    }

    async fn put(&self, key: RequestKey, response: Response) -> Result<(), Error> {
        let n = self.fail.puts.fetch_add(1, Ordering::SeqCst) + 1;
        let fail_at = self.fail.fail_put_at.load(Ordering::SeqCst);
        if fail_at != 0 && n >= fail_at {
            return Err(Error::CorruptEntry(format!("write {n} rejected")));
        }
        self.inner.put(key, response).await
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool, Error> {
        self.inner.delete(key).await
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        self.inner.keys().await
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn Partition>, Error> {
        self.fail.reads_failing()?;
        let inner = self.inner.open(name).await?;
        Ok(Arc::new(FlakyPartition { inner, fail: self.fail.clone() }))
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        self.inner.has(name).await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.inner.delete(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.inner.keys().await
    }
}

/// Like [`site_worker`], over [`FlakyStorage`].
pub fn flaky_worker() -> (ServiceWorker, Arc<FlakyStorage>, Arc<FakeNetwork>) {
    let origin = Url::parse(ORIGIN).unwrap();
    let storage = Arc::new(FlakyStorage::default());
    let network = Arc::new(FakeNetwork::new(origin.clone()));
    let worker = ServiceWorker::new(storage.clone(), network.clone(), origin);
    (worker, storage, network)
}

/// A fresh worker on [`ORIGIN`] with in-memory storage and a scripted network.
pub fn site_worker() -> (ServiceWorker, Arc<MemoryStorage>, Arc<FakeNetwork>) {
    let origin = Url::parse(ORIGIN).unwrap();
    let storage = Arc::new(MemoryStorage::new());
    let network = Arc::new(FakeNetwork::new(origin.clone()));
    let worker = ServiceWorker::new(storage.clone(), network.clone(), origin);
    (worker, storage, network)
}

/// A 200 response for `request`.
pub fn page(request: &Request, body: impl Into<Bytes>) -> Response {
    Response::new(200, body)
        .with_status_text("OK")
        .with_header("content-type", "text/html; charset=utf-8")
        .with_url(request.url.as_str())
}

/// Poll `condition` for up to a second.
pub async fn wait_until<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
