//! Redirect resolution for short codes.
//!
//! [`RedirectorService`] answers "where does this code point?" by reading
//! through a [`LinkCache`](linkhop_core::LinkCache) into a
//! [`ReadLinkStore`](linkhop_core::ReadLinkStore). Private links resolve
//! exactly like missing ones.
//!
//! # Example
//!
//! ```rust
//! use linkhop_cache::MokaLinkCache;
//! use linkhop_core::ShortCode;
//! use linkhop_redirector::{Resolution, RedirectorService};
//! use linkhop_storage::InMemoryLinkStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryLinkStore::new());
//! let service = RedirectorService::new(store, MokaLinkCache::new());
//!
//! let code = ShortCode::new("abc123")?;
//! if let Resolution::Redirect(target) = service.resolve(&code).await? {
//!     println!("Redirect to: {}", target.url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod redirector;
pub mod service;

pub use error::{RedirectorError, Result};
pub use redirector::{RedirectTarget, Redirector, Resolution};
pub use service::RedirectorService;
