//! Owner-facing link management.
//!
//! [`LinkService`] creates, lists, edits and deletes links on behalf of an
//! authenticated owner and keeps the resolution cache honest: every write
//! invalidates the affected code before the call returns.

pub mod error;
pub mod manager;
pub mod service;

pub use error::{LinkError, Result};
pub use manager::{
    CreateLink, LinkListing, LinkManager, ListFilter, UpdateLink, VisibilityFilter,
};
pub use service::LinkService;
