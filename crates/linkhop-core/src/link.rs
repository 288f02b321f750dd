use crate::error::CoreError;
use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;
use url::Url;

const TITLE_MIN_CHARS: usize = 2;
const TITLE_MAX_CHARS: usize = 50;
const OWNER_MAX_LEN: usize = 128;

/// Store-assigned identifier of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(u64);

impl LinkId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the account owning a link, as handed over by the identity
/// provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidOwner("owner id cannot be empty".to_string()));
        }
        if trimmed.len() > OWNER_MAX_LEN {
            return Err(CoreError::InvalidOwner(format!(
                "owner id must be at most {} bytes",
                OWNER_MAX_LEN
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OwnerId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerId> for String {
    fn from(id: OwnerId) -> Self {
        id.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Human readable label shown on the owner's dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Title(String);

impl Title {
    /// Trims the input and checks it is 2-50 characters long.
    pub fn new(title: impl Into<String>) -> Result<Self, CoreError> {
        let title = title.into();
        let trimmed = title.trim();
        let chars = trimmed.chars().count();
        if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&chars) {
            return Err(CoreError::InvalidTitle(format!(
                "length must be between {} and {} characters, got {}",
                TITLE_MIN_CHARS, TITLE_MAX_CHARS, chars
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Title {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Title> for String {
    fn from(title: Title) -> Self {
        title.0
    }
}

/// An absolute `http` or `https` URL a short code redirects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetUrl(String);

impl TargetUrl {
    pub fn parse(url: impl Into<String>) -> Result<Self, CoreError> {
        let url = url.into();
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidUrl("URL cannot be empty".to_string()));
        }

        // `Url::parse` silently strips tabs and newlines; the stored value
        // must be usable as a `Location` header as is.
        if trimmed.chars().any(char::is_control) {
            return Err(CoreError::InvalidUrl(
                "URL must not contain control characters".to_string(),
            ));
        }

        let parsed = Url::parse(trimmed)
            .map_err(|e| CoreError::InvalidUrl(format!("{}: {}", trimmed, e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(CoreError::InvalidUrl(format!(
                "URL scheme must be http or https: {}",
                parsed.scheme()
            )));
        }

        if !parsed.host_str().is_some_and(|host| !host.is_empty()) {
            return Err(CoreError::InvalidUrl(format!(
                "URL must have a host: {}",
                trimmed
            )));
        }

        // Store the serialized form, except for the trailing slash `Url`
        // appends to bare origins.
        let serialized = parsed.as_str();
        if serialized.strip_suffix('/') == Some(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Ok(Self(serialized.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TargetUrl {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TargetUrl> for String {
    fn from(url: TargetUrl) -> Self {
        url.0
    }
}

impl Display for TargetUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a link may be resolved by anonymous visitors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(format!("unknown visibility '{}'", other)),
        }
    }
}

/// A stored link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub code: ShortCode,
    pub title: Title,
    pub target_url: TargetUrl,
    pub owner_id: OwnerId,
    pub visibility: Visibility,
    pub tags: BTreeSet<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Link {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// The caller-supplied part of a link, handed to [`LinkStore::create`].
///
/// The store assigns `id`, `created_at` and `updated_at`.
///
/// [`LinkStore::create`]: crate::store::LinkStore::create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub code: ShortCode,
    pub title: Title,
    pub target_url: TargetUrl,
    pub owner_id: OwnerId,
    pub visibility: Visibility,
    pub tags: BTreeSet<String>,
}

impl NewLink {
    /// Materializes the stored link.
    pub fn into_link(self, id: LinkId, now: Timestamp) -> Link {
        Link {
            id,
            code: self.code,
            title: self.title,
            target_url: self.target_url,
            owner_id: self.owner_id,
            visibility: self.visibility,
            tags: self.tags,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Owner edits to an existing link. There is no code field: codes are never
/// reassigned.
///
/// Tags are applied in order: `tags` replaces the set, then `add_tags` are
/// inserted, then `remove_tags` are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPatch {
    pub title: Option<Title>,
    pub target_url: Option<TargetUrl>,
    pub visibility: Option<Visibility>,
    pub tags: Option<BTreeSet<String>>,
    pub add_tags: BTreeSet<String>,
    pub remove_tags: BTreeSet<String>,
}

impl LinkPatch {
    /// Applies the patch in place and refreshes `updated_at`.
    pub fn apply(&self, link: &mut Link, now: Timestamp) {
        if let Some(title) = &self.title {
            link.title = title.clone();
        }
        if let Some(target_url) = &self.target_url {
            link.target_url = target_url.clone();
        }
        if let Some(visibility) = self.visibility {
            link.visibility = visibility;
        }
        if let Some(tags) = &self.tags {
            link.tags = tags.clone();
        }
        link.tags.extend(self.add_tags.iter().cloned());
        link.tags.retain(|tag| !self.remove_tags.contains(tag));
        // Timestamps never go backwards, even if the clock does.
        link.updated_at = now.max(link.updated_at);
    }
}

/// Trims tags and drops blank ones.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}
