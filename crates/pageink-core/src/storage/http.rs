//! HTTP storage against the `/annotations` endpoints.
//!
//! Each request runs `ureq` on its own thread, so awaiting a save or load never
//! blocks the thread that handles input. The returned future is woken when the
//! response arrives.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::annotation::AnnotationSet;
use crate::protocol::{LoadResponse, SaveRequest, SaveResponse};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, Waker};
use std::thread;
use std::time::Duration;
use url::Url;

/// Storage backed by a remote annotation service.
#[derive(Clone)]
pub struct HttpStorage {
    agent: ureq::Agent,
    base_url: Url,
}

impl HttpStorage {
    /// Create a client for the service at `base_url` (e.g. `http://localhost:3030`).
    pub fn new(base_url: &str, timeout: Duration) -> StorageResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| StorageError::Http(format!("Invalid base URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StorageError::Http(format!("{base_url} cannot be a base URL")));
        }
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("pageink/", env!("CARGO_PKG_VERSION")))
            .build();
        Ok(Self { agent, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/annotations`, or `{base}/annotations/{id}` with the id as one path segment.
    fn endpoint(&self, document_id: Option<&str>) -> StorageResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| StorageError::Http(format!("{} cannot be a base URL", self.base_url)))?;
            segments.pop_if_empty().push("annotations");
            if let Some(id) = document_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn fetch(&self, document_id: &str) -> StorageResult<AnnotationSet> {
        let url = self.endpoint(Some(document_id))?;
        match self.agent.get(url.as_str()).call() {
            Ok(resp) => {
                let body: LoadResponse = resp
                    .into_json()
                    .map_err(|e| StorageError::Serialization(format!("Invalid load response: {e}")))?;
                if body.success {
                    Ok(body.annotations)
                } else {
                    Err(StorageError::NotFound(document_id.to_string()))
                }
            }
            Err(ureq::Error::Status(404, _)) => Err(StorageError::NotFound(document_id.to_string())),
            Err(ureq::Error::Status(code, _)) => Err(StorageError::Http(format!("GET returned status {code}"))),
            Err(e) => Err(StorageError::Http(e.to_string())),
        }
    }

    fn submit(&self, document_id: &str, annotations: AnnotationSet) -> StorageResult<()> {
        let url = self.endpoint(None)?;
        let request = SaveRequest {
            document_id: document_id.to_string(),
            annotations,
        };
        let resp = self.agent.post(url.as_str()).send_json(&request).map_err(|e| match e {
            ureq::Error::Status(code, _) => StorageError::Http(format!("POST returned status {code}")),
            other => StorageError::Http(other.to_string()),
        })?;
        let body: SaveResponse = resp
            .into_json()
            .map_err(|e| StorageError::Serialization(format!("Invalid save response: {e}")))?;
        if body.success {
            Ok(())
        } else {
            Err(StorageError::Rejected(document_id.to_string()))
        }
    }
}

impl Storage for HttpStorage {
    fn save(&self, document_id: &str, annotations: &AnnotationSet) -> BoxFuture<'_, StorageResult<()>> {
        let (client, id, annotations) = (self.clone(), document_id.to_string(), annotations.clone());
        Box::pin(spawn_request(move || client.submit(&id, annotations)))
    }

    fn load(&self, document_id: &str) -> BoxFuture<'_, StorageResult<AnnotationSet>> {
        let (client, id) = (self.clone(), document_id.to_string());
        Box::pin(spawn_request(move || client.fetch(&id)))
    }

    /// Saving an empty set is the service's way of deleting.
    fn delete(&self, document_id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let (client, id) = (self.clone(), document_id.to_string());
        Box::pin(spawn_request(move || client.submit(&id, AnnotationSet::new())))
    }

    fn exists(&self, document_id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let (client, id) = (self.clone(), document_id.to_string());
        Box::pin(spawn_request(move || match client.fetch(&id) {
            Ok(set) => Ok(!set.is_empty()),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }))
    }
}

struct Slot<T> {
    result: Option<T>,
    waker: Option<Waker>,
}

fn lock<T>(slot: &Mutex<Slot<T>>) -> MutexGuard<'_, Slot<T>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Resolves once the request thread stores its result.
struct RequestFuture<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> Future for RequestFuture<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut slot = lock(&self.slot);
        match slot.result.take() {
            Some(result) => Poll::Ready(result),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Run a blocking request on a worker thread.
fn spawn_request<T, F>(request: F) -> RequestFuture<StorageResult<T>>
where
    T: Send + 'static,
    F: FnOnce() -> StorageResult<T> + Send + 'static,
{
    let slot = Arc::new(Mutex::new(Slot { result: None, waker: None }));
    let shared = Arc::clone(&slot);
    let spawned = thread::Builder::new().name("pageink-http".into()).spawn(move || {
        let result = request();
        let mut slot = lock(&shared);
        slot.result = Some(result);
        if let Some(waker) = slot.waker.take() {
            waker.wake();
        }
    });
    if let Err(e) = spawned {
        lock(&slot).result = Some(Err(StorageError::Other(format!("Failed to start request thread: {e}"))));
    }
    RequestFuture { slot }
}
