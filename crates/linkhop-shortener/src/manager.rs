use crate::Result;
use async_trait::async_trait;
use linkhop_core::{
    normalize_tags, CoreError, Link, LinkId, LinkPatch, OwnerId, ShortCode, TargetUrl, Title,
    Visibility,
};
use serde::Deserialize;
use std::collections::BTreeSet;

/// Parameters for a new link, as submitted by its owner.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLink {
    pub title: String,
    pub target_url: String,
    /// A caller-chosen code; a random one is allocated when absent.
    #[serde(default)]
    pub custom_code: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An owner's edit of an existing link. Absent fields are left unchanged.
///
/// There is deliberately no code field: codes never change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateLink {
    pub title: Option<String>,
    pub target_url: Option<String>,
    pub visibility: Option<Visibility>,
    /// Replaces the whole tag set.
    pub tags: Option<Vec<String>>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
}

impl UpdateLink {
    /// Validates the edit and turns it into a store patch.
    pub fn into_patch(self) -> std::result::Result<LinkPatch, CoreError> {
        Ok(LinkPatch {
            title: self.title.map(Title::new).transpose()?,
            target_url: self.target_url.map(TargetUrl::parse).transpose()?,
            visibility: self.visibility,
            tags: self.tags.map(normalize_tags),
            add_tags: normalize_tags(self.add_tags),
            remove_tags: normalize_tags(self.remove_tags),
        })
    }
}

/// Which visibility a listing keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityFilter {
    #[default]
    All,
    Public,
    Private,
}

/// Narrows an owner's listing. Unset or blank fields match every link.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListFilter {
    /// Case-insensitive substring of the title.
    #[serde(rename = "q")]
    pub query: Option<String>,
    pub visibility: VisibilityFilter,
    /// Exact tag the link must carry.
    pub tag: Option<String>,
}

impl ListFilter {
    pub fn matches(&self, link: &Link) -> bool {
        let query = self
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        if let Some(query) = query {
            let query = query.to_lowercase();
            if !link.title.as_str().to_lowercase().contains(&query) {
                return false;
            }
        }

        let visible = match self.visibility {
            VisibilityFilter::All => true,
            VisibilityFilter::Public => link.visibility == Visibility::Public,
            VisibilityFilter::Private => link.visibility == Visibility::Private,
        };
        if !visible {
            return false;
        }

        match self.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(tag) => link.tags.contains(tag),
            None => true,
        }
    }
}

/// The result of listing an owner's links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkListing {
    /// Links passing the filter, newest first.
    pub links: Vec<Link>,
    /// Number of links the owner has before filtering.
    pub total: usize,
    /// Every tag used across the owner's links.
    pub tags: BTreeSet<String>,
}

impl LinkListing {
    /// Builds a listing from all of an owner's links.
    pub fn filtered(links: Vec<Link>, filter: &ListFilter) -> Self {
        let total = links.len();
        let tags = links
            .iter()
            .flat_map(|link| link.tags.iter().cloned())
            .collect();
        let links = links
            .into_iter()
            .filter(|link| filter.matches(link))
            .collect();

        Self { links, total, tags }
    }
}

/// Link management on behalf of an authenticated owner.
#[async_trait]
pub trait LinkManager: Send + Sync + 'static {
    /// Creates a link under a custom or freshly allocated code.
    async fn create(&self, owner: &OwnerId, request: CreateLink) -> Result<Link>;

    /// Lists the owner's links matching `filter`, newest first.
    async fn list(&self, owner: &OwnerId, filter: &ListFilter) -> Result<LinkListing>;

    /// Returns one of the owner's links by code.
    ///
    /// Links owned by someone else read as not found.
    async fn get(&self, owner: &OwnerId, code: &ShortCode) -> Result<Link>;

    async fn update(&self, owner: &OwnerId, id: LinkId, request: UpdateLink) -> Result<Link>;

    /// Deletes the link and returns it as it was.
    async fn delete(&self, owner: &OwnerId, id: LinkId) -> Result<Link>;
}
