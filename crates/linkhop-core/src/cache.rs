use crate::error::StorageError;
use crate::link::Link;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::future::Future;

/// A read-through cache of links keyed by [`ShortCode`].
///
/// Implementations must never remember a miss: codes are created at runtime,
/// and a cached "not found" would hide a link that was just created.
#[async_trait]
pub trait LinkCache: Send + Sync + 'static {
    /// Returns the cached link, or `None` on a miss or an expired entry.
    async fn get(&self, code: &ShortCode) -> Option<Link>;

    /// Stores a link under `code`.
    async fn put(&self, code: &ShortCode, link: &Link);

    /// Removes the entry for `code`.
    ///
    /// It is not an error if the key does not exist.
    async fn invalidate(&self, code: &ShortCode);

    /// Removes every entry.
    async fn invalidate_all(&self);

    /// Returns the cached link, loading and caching it on a miss.
    ///
    /// Loader errors are returned to the caller and leave no entry behind.
    async fn get_or_load<F, Fut>(
        &self,
        code: &ShortCode,
        load: F,
    ) -> Result<Option<Link>, StorageError>
    where
        F: Fn(ShortCode) -> Fut + Send + Sync,
        Fut: Future<Output = Result<Option<Link>, StorageError>> + Send,
    {
        if let Some(link) = self.get(code).await {
            return Ok(Some(link));
        }

        let loaded = load(code.clone()).await?;
        if let Some(ref link) = loaded {
            self.put(code, link).await;
        }
        Ok(loaded)
    }
}
