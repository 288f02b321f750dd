pub mod random;

use linkhop_core::ShortCode;

/// Trait for generating candidate short codes.
///
/// Implementations are pure generators that don't interact with storage.
/// A candidate may already be taken; the allocator finds out when the store
/// rejects it.
pub trait Generator: Send + Sync + 'static {
    fn generate(&self) -> ShortCode;
}
