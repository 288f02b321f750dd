use async_trait::async_trait;
use linkhop_core::store::{LinkStore, ReadLinkStore, Result};
use linkhop_core::{Link, LinkId, LinkPatch, NewLink, OwnerId, ShortCode, StorageError};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default deadline for a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// A store decorator that bounds every call with a deadline.
///
/// A call that outlives the deadline is dropped and reported as
/// [`StorageError::Timeout`], so callers never hang on a stuck backend.
#[derive(Debug, Clone)]
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout = ?self.timeout, "store call timed out");
                Err(StorageError::Timeout(format!(
                    "{} exceeded {:?}",
                    operation, self.timeout
                )))
            }
        }
    }
}

#[async_trait]
impl<S: ReadLinkStore> ReadLinkStore for TimeoutStore<S> {
    async fn get_by_code(&self, code: &ShortCode) -> Result<Option<Link>> {
        self.bounded("get_by_code", self.inner.get_by_code(code))
            .await
    }

    async fn get_by_owner(&self, owner: &OwnerId) -> Result<Vec<Link>> {
        self.bounded("get_by_owner", self.inner.get_by_owner(owner))
            .await
    }
}

#[async_trait]
impl<S: LinkStore> LinkStore for TimeoutStore<S> {
    async fn create(&self, link: NewLink) -> Result<Link> {
        self.bounded("create", self.inner.create(link)).await
    }

    async fn update(&self, id: LinkId, owner: &OwnerId, patch: LinkPatch) -> Result<Link> {
        self.bounded("update", self.inner.update(id, owner, patch))
            .await
    }

    async fn delete(&self, id: LinkId, owner: &OwnerId) -> Result<Link> {
        self.bounded("delete", self.inner.delete(id, owner)).await
    }
}
