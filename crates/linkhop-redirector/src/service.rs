use crate::redirector::{RedirectTarget, Redirector, Resolution};
use crate::RedirectorError;
use async_trait::async_trait;
use linkhop_core::{LinkCache, ReadLinkStore, ShortCode};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Service for handling redirects.
///
/// Reads go through the cache; a miss loads the link from the store and
/// populates the cache. The service never writes to the store.
#[derive(Debug, Clone)]
pub struct RedirectorService<S, C> {
    store: Arc<S>,
    cache: C,
}

impl<S: ReadLinkStore, C: LinkCache> RedirectorService<S, C> {
    /// Creates a new RedirectorService over a shared store and cache handle.
    pub fn new(store: Arc<S>, cache: C) -> Self {
        Self { store, cache }
    }

    /// Resolves a short code to its redirect target.
    ///
    /// * `Ok(Resolution::Redirect(_))` - the code exists and is public
    /// * `Ok(Resolution::NotFound)` - the code is unknown or private
    /// * `Err(_)` - the store could not be reached
    pub async fn resolve(&self, code: &ShortCode) -> crate::Result<Resolution> {
        Redirector::resolve(self, code).await
    }
}

#[async_trait]
impl<S: ReadLinkStore, C: LinkCache> Redirector for RedirectorService<S, C> {
    async fn resolve(&self, code: &ShortCode) -> crate::Result<Resolution> {
        trace!(code = %code, "resolving short code");

        let store = &self.store;
        let link = self
            .cache
            .get_or_load(code, |code| {
                let store = Arc::clone(store);
                async move { store.get_by_code(&code).await }
            })
            .await
            .map_err(|err| {
                warn!(code = %code, error = %err, "link lookup failed");
                RedirectorError::from(err)
            })?;

        match link {
            Some(link) if link.is_public() => {
                debug!(code = %code, url = %link.target_url, "resolved short code");
                Ok(Resolution::Redirect(RedirectTarget {
                    url: link.target_url,
                }))
            }
            Some(_) => {
                debug!(code = %code, "short code is private");
                Ok(Resolution::NotFound)
            }
            None => {
                trace!(code = %code, "short code not found");
                Ok(Resolution::NotFound)
            }
        }
    }
}
