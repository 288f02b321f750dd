//! Short code allocation.
//!
//! A [`Generator`] proposes codes without touching storage; the
//! [`CodeAllocator`] turns proposals into stored links, relying on the
//! store's atomic uniqueness check and retrying a bounded number of times on
//! collisions.

pub mod allocator;
pub mod error;
pub mod generator;

pub use allocator::{CodeAllocator, LinkDraft, DEFAULT_MAX_ATTEMPTS};
pub use error::AllocationError;
pub use generator::random::RandomGenerator;
pub use generator::Generator;
