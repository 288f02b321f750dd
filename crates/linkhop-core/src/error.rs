use thiserror::Error;

/// Validation failures for the values that make up a link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid title: {0}")]
    InvalidTitle(String),
    #[error("invalid owner id: {0}")]
    InvalidOwner(String),
}

/// Errors returned by link store implementations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("short code already taken: {0}")]
    CodeTaken(String),
    #[error("link not found")]
    NotFound,
    #[error("link is owned by another account")]
    Forbidden,
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StorageError {
    /// Whether the error says nothing about the outcome of the operation.
    ///
    /// A timed-out or unavailable write may still have been applied by the
    /// backend.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, StorageError::Unavailable(_) | StorageError::Timeout(_))
    }
}
