//! HTTP surface of linkhop.
//!
//! Serves `GET /{code}` redirects for visitors and a small JSON API under
//! `/v1/links` for link owners. The owner's identity is taken from the
//! `x-owner-id` header set by the authenticating proxy in front of us.

pub mod app;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use error::{AppError, Result};
pub use state::AppState;
