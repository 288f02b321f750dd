use crate::Result;
use async_trait::async_trait;
use linkhop_core::{ShortCode, TargetUrl};
use serde::Serialize;

/// Where a resolved code sends the visitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectTarget {
    pub url: TargetUrl,
}

/// Outcome of resolving a short code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Redirect(RedirectTarget),
    /// The code is unknown, deleted or private.
    NotFound,
}

#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Resolves a short code to its redirect target.
    async fn resolve(&self, code: &ShortCode) -> Result<Resolution>;
}
