use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use linkhop_core::store::{LinkStore, ReadLinkStore, Result};
use linkhop_core::{Link, LinkId, LinkPatch, NewLink, OwnerId, ShortCode, StorageError};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// In-memory implementation of the link store using DashMap.
///
/// Links are keyed by code; the vacant-entry insert on that map is what makes
/// `create` an atomic insert-if-absent. A second map indexes codes by id for
/// owner edits.
#[derive(Debug, Default)]
pub struct InMemoryLinkStore {
    links: DashMap<String, Link>,
    ids: DashMap<LinkId, String>,
    next_id: AtomicU64,
}

impl InMemoryLinkStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored links.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    fn code_of(&self, id: LinkId) -> Result<String> {
        self.ids
            .get(&id)
            .map(|code| code.value().clone())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ReadLinkStore for InMemoryLinkStore {
    async fn get_by_code(&self, code: &ShortCode) -> Result<Option<Link>> {
        Ok(self.links.get(code.as_str()).map(|link| link.value().clone()))
    }

    async fn get_by_owner(&self, owner: &OwnerId) -> Result<Vec<Link>> {
        let mut links: Vec<Link> = self
            .links
            .iter()
            .filter(|entry| entry.owner_id == *owner)
            .map(|entry| entry.value().clone())
            .collect();
        links.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(links)
    }
}

#[async_trait]
impl LinkStore for InMemoryLinkStore {
    async fn create(&self, link: NewLink) -> Result<Link> {
        let key = link.code.as_str().to_owned();

        match self.links.entry(key.clone()) {
            Entry::Occupied(_) => {
                trace!(code = %link.code, "code already taken");
                Err(StorageError::CodeTaken(key))
            }
            Entry::Vacant(vacant) => {
                let id = LinkId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
                let stored = link.into_link(id, Timestamp::now());
                vacant.insert(stored.clone());
                self.ids.insert(id, key);
                Ok(stored)
            }
        }
    }

    async fn update(&self, id: LinkId, owner: &OwnerId, patch: LinkPatch) -> Result<Link> {
        let code = self.code_of(id)?;

        let mut entry = self.links.get_mut(&code).ok_or(StorageError::NotFound)?;
        if entry.id != id {
            return Err(StorageError::NotFound);
        }
        if entry.owner_id != *owner {
            return Err(StorageError::Forbidden);
        }

        patch.apply(entry.value_mut(), Timestamp::now());
        Ok(entry.value().clone())
    }

    async fn delete(&self, id: LinkId, owner: &OwnerId) -> Result<Link> {
        let code = self.code_of(id)?;

        {
            let entry = self.links.get(&code).ok_or(StorageError::NotFound)?;
            if entry.id != id {
                return Err(StorageError::NotFound);
            }
            if entry.owner_id != *owner {
                return Err(StorageError::Forbidden);
            }
        }

        // Re-check under the shard write lock; a concurrent delete may have won.
        let (_, removed) = self
            .links
            .remove_if(&code, |_, link| link.id == id && link.owner_id == *owner)
            .ok_or(StorageError::NotFound)?;
        self.ids.remove(&id);
        Ok(removed)
    }
}
