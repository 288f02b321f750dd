//! The resolution cache: an in-memory, read-through cache of links.

pub mod moka;

pub use self::moka::{CacheConfig, MokaLinkCache, DEFAULT_MAX_CAPACITY, DEFAULT_TTL};
pub use linkhop_core::LinkCache;
