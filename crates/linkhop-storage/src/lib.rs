//! Link store implementations.

pub mod memory;
pub mod mysql;
pub mod timeout;

pub use linkhop_core::store::{LinkStore, ReadLinkStore, Result};
pub use linkhop_core::StorageError;
pub use memory::InMemoryLinkStore;
pub use mysql::MySqlLinkStore;
pub use timeout::TimeoutStore;
