use linkhop_core::StorageError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AllocationError {
    #[error("no free short code after {attempts} attempts")]
    Exhausted { attempts: u32 },
    #[error("short code already taken: {0}")]
    CodeTaken(String),
    #[error("invalid code length {0}, expected 4 to 16")]
    InvalidLength(usize),
    #[error(transparent)]
    Storage(StorageError),
}
