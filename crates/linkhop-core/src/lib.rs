//! Core types and traits for the linkhop short-code resolution service.
//!
//! This crate provides the link model, the store and cache contracts and the
//! storage error taxonomy shared by the allocator, the redirector and the
//! link management service.

pub mod cache;
pub mod error;
pub mod link;
pub mod shortcode;
pub mod store;

pub use cache::LinkCache;
pub use error::{CoreError, StorageError};
pub use link::{
    normalize_tags, Link, LinkId, LinkPatch, NewLink, OwnerId, TargetUrl, Title, Visibility,
};
pub use shortcode::ShortCode;
pub use store::{LinkStore, ReadLinkStore};
