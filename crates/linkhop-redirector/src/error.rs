use linkhop_core::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedirectorError>;

#[derive(Debug, Clone, Error)]
pub enum RedirectorError {
    #[error("link store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StorageError> for RedirectorError {
    fn from(value: StorageError) -> Self {
        Self::StoreUnavailable(value.to_string())
    }
}
