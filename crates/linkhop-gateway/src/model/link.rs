use jiff::Timestamp;
use linkhop_core::{Link, Visibility};
use linkhop_shortener::LinkListing;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: u64,
    pub code: String,
    pub short_url: String,
    pub title: String,
    pub target_url: String,
    pub visibility: Visibility,
    pub tags: BTreeSet<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LinkResponse {
    pub fn from_link(link: Link, base_url: &str) -> Self {
        Self {
            id: link.id.get(),
            short_url: link.code.to_url(base_url),
            code: link.code.into(),
            title: link.title.into(),
            target_url: link.target_url.into(),
            visibility: link.visibility,
            tags: link.tags,
            created_at: link.created_at,
            updated_at: link.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub links: Vec<LinkResponse>,
    /// Links the owner has before filtering.
    pub total: usize,
    pub tags: BTreeSet<String>,
}

impl LinkListResponse {
    pub fn from_listing(listing: LinkListing, base_url: &str) -> Self {
        Self {
            links: listing
                .links
                .into_iter()
                .map(|link| LinkResponse::from_link(link, base_url))
                .collect(),
            total: listing.total,
            tags: listing.tags,
        }
    }
}
