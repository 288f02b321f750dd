use linkhop_allocator::AllocationError;
use linkhop_core::{CoreError, StorageError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LinkError>;

#[derive(Debug, Clone, Error)]
pub enum LinkError {
    #[error("short code already taken: {0}")]
    CodeTaken(String),
    #[error("no free short code after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },
    #[error("link not found")]
    NotFound,
    #[error("link is owned by another account")]
    Forbidden,
    #[error("link store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("invalid title: {0}")]
    InvalidTitle(String),
    #[error("invalid owner id: {0}")]
    InvalidOwner(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for LinkError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidShortCode(message) => Self::InvalidShortCode(message),
            CoreError::InvalidUrl(message) => Self::InvalidUrl(message),
            CoreError::InvalidTitle(message) => Self::InvalidTitle(message),
            CoreError::InvalidOwner(message) => Self::InvalidOwner(message),
        }
    }
}

impl From<StorageError> for LinkError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::CodeTaken(code) => Self::CodeTaken(code),
            StorageError::NotFound => Self::NotFound,
            StorageError::Forbidden => Self::Forbidden,
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<AllocationError> for LinkError {
    fn from(value: AllocationError) -> Self {
        match value {
            AllocationError::Exhausted { attempts } => Self::AllocationExhausted { attempts },
            AllocationError::CodeTaken(code) => Self::CodeTaken(code),
            AllocationError::Storage(err) => err.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}
