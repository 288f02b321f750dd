use std::sync::Arc;

use linkhop_redirector::Redirector;
use linkhop_shortener::LinkManager;

#[derive(Clone)]
pub struct AppState {
    links: Arc<dyn LinkManager>,
    redirector: Arc<dyn Redirector>,
    base_url: String,
}

impl AppState {
    pub fn new(
        links: Arc<dyn LinkManager>,
        redirector: Arc<dyn Redirector>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            links,
            redirector,
            base_url: public_base_url.into(),
        }
    }

    pub fn links(&self) -> &dyn LinkManager {
        self.links.as_ref()
    }

    pub fn redirector(&self) -> &dyn Redirector {
        self.redirector.as_ref()
    }

    /// Public base URL that short links are served under.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
