use crate::error::StorageError;
use crate::link::{Link, LinkId, LinkPatch, NewLink, OwnerId};
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::sync::Arc;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A read-only view of a link store.
///
/// The redirector and the resolution cache only need these lookups.
#[async_trait]
pub trait ReadLinkStore: Send + Sync + 'static {
    /// Retrieves the link for a given short code.
    /// Returns `None` if the code does not exist.
    async fn get_by_code(&self, code: &ShortCode) -> Result<Option<Link>>;

    /// Lists the links of one owner, newest first.
    async fn get_by_owner(&self, owner: &OwnerId) -> Result<Vec<Link>>;
}

/// Durable storage for links.
///
/// Implementations must enforce code uniqueness atomically: two concurrent
/// `create` calls for the same code never both succeed. Owner checks happen
/// here, before any mutation.
#[async_trait]
pub trait LinkStore: ReadLinkStore {
    /// Inserts a new link. Returns `Err(CodeTaken)` if the code already exists.
    async fn create(&self, link: NewLink) -> Result<Link>;

    /// Applies `patch` to the link `id` if `owner` owns it.
    ///
    /// Returns `Err(NotFound)` for unknown ids and `Err(Forbidden)` for links
    /// owned by someone else.
    async fn update(&self, id: LinkId, owner: &OwnerId, patch: LinkPatch) -> Result<Link>;

    /// Removes the link `id` if `owner` owns it and returns the removed link.
    async fn delete(&self, id: LinkId, owner: &OwnerId) -> Result<Link>;
}

#[async_trait]
impl<S: ReadLinkStore> ReadLinkStore for Arc<S> {
    async fn get_by_code(&self, code: &ShortCode) -> Result<Option<Link>> {
        (**self).get_by_code(code).await
    }

    async fn get_by_owner(&self, owner: &OwnerId) -> Result<Vec<Link>> {
        (**self).get_by_owner(owner).await
    }
}

#[async_trait]
impl<S: LinkStore> LinkStore for Arc<S> {
    async fn create(&self, link: NewLink) -> Result<Link> {
        (**self).create(link).await
    }

    async fn update(&self, id: LinkId, owner: &OwnerId, patch: LinkPatch) -> Result<Link> {
        (**self).update(id, owner, patch).await
    }

    async fn delete(&self, id: LinkId, owner: &OwnerId) -> Result<Link> {
        (**self).delete(id, owner).await
    }
}
