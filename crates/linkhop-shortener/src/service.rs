use crate::manager::{CreateLink, LinkListing, LinkManager, ListFilter, UpdateLink};
use crate::{LinkError, Result};
use async_trait::async_trait;
use linkhop_allocator::{CodeAllocator, Generator, LinkDraft};
use linkhop_core::{
    normalize_tags, Link, LinkCache, LinkId, LinkStore, OwnerId, ShortCode, TargetUrl, Title,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A concrete implementation of the [`LinkManager`] trait.
///
/// Writes go to the store first and then invalidate the resolution cache for
/// the affected code. Updates and deletes run the pair on a detached task, so
/// a caller that gives up halfway cannot leave a stale entry behind.
#[derive(Debug, Clone)]
pub struct LinkService<S, G, C> {
    store: Arc<S>,
    allocator: Arc<CodeAllocator<G>>,
    cache: C,
}

impl<S, G, C> LinkService<S, G, C>
where
    S: LinkStore,
    G: Generator,
    C: LinkCache + Clone,
{
    pub fn new(store: Arc<S>, allocator: CodeAllocator<G>, cache: C) -> Self {
        Self {
            store,
            allocator: Arc::new(allocator),
            cache,
        }
    }

    /// Runs a store write and the matching invalidation to completion, even
    /// if the caller stops waiting.
    async fn write_detached<W, Fut>(&self, operation: &'static str, write: W) -> Result<Link>
    where
        W: FnOnce(Arc<S>) -> Fut,
        Fut: std::future::Future<Output = linkhop_core::store::Result<Link>> + Send + 'static,
    {
        let written = write(Arc::clone(&self.store));
        let cache = self.cache.clone();

        let task = tokio::spawn(async move {
            let result = written.await;
            settle(&cache, operation, result).await
        });

        task.await.map_err(|err| {
            LinkError::StoreUnavailable(format!("{} task failed: {}", operation, err))
        })?
    }
}

/// Invalidates whatever a finished write may have made stale.
async fn settle<C: LinkCache>(
    cache: &C,
    operation: &'static str,
    result: linkhop_core::store::Result<Link>,
) -> Result<Link> {
    match result {
        Ok(link) => {
            cache.invalidate(&link.code).await;
            info!(operation, code = %link.code, id = %link.id, "link written");
            Ok(link)
        }
        Err(err) if err.is_ambiguous() => {
            // The write may or may not have landed and the code is unknown
            // here, so nothing cached can be trusted.
            warn!(operation, error = %err, "ambiguous store outcome, flushing resolution cache");
            cache.invalidate_all().await;
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

#[async_trait]
impl<S, G, C> LinkManager for LinkService<S, G, C>
where
    S: LinkStore,
    G: Generator,
    C: LinkCache + Clone,
{
    async fn create(&self, owner: &OwnerId, request: CreateLink) -> Result<Link> {
        let draft = LinkDraft {
            title: Title::new(request.title)?,
            target_url: TargetUrl::parse(request.target_url)?,
            owner_id: owner.clone(),
            visibility: request.visibility,
            tags: normalize_tags(request.tags),
        };

        let link = match request.custom_code {
            Some(code) => {
                let code = ShortCode::new(code)?;
                self.allocator
                    .claim(self.store.as_ref(), code, draft)
                    .await?
            }
            None => self.allocator.allocate(self.store.as_ref(), draft).await?,
        };

        self.cache.invalidate(&link.code).await;
        info!(owner = %owner, code = %link.code, id = %link.id, "link created");
        Ok(link)
    }

    async fn list(&self, owner: &OwnerId, filter: &ListFilter) -> Result<LinkListing> {
        let links = self.store.get_by_owner(owner).await?;
        let listing = LinkListing::filtered(links, filter);
        debug!(
            owner = %owner,
            shown = listing.links.len(),
            total = listing.total,
            "listed links"
        );
        Ok(listing)
    }

    async fn get(&self, owner: &OwnerId, code: &ShortCode) -> Result<Link> {
        match self.store.get_by_code(code).await? {
            Some(link) if link.owner_id == *owner => Ok(link),
            _ => Err(LinkError::NotFound),
        }
    }

    async fn update(&self, owner: &OwnerId, id: LinkId, request: UpdateLink) -> Result<Link> {
        let patch = request.into_patch()?;
        let owner = owner.clone();

        self.write_detached("update", move |store| async move {
            store.update(id, &owner, patch).await
        })
        .await
    }

    async fn delete(&self, owner: &OwnerId, id: LinkId) -> Result<Link> {
        let owner = owner.clone();

        self.write_detached("delete", move |store| async move {
            store.delete(id, &owner).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkhop_allocator::RandomGenerator;
    use linkhop_cache::MokaLinkCache;
    use linkhop_core::{LinkPatch, NewLink, ReadLinkStore, StorageError, Visibility};
    use linkhop_redirector::{RedirectTarget, RedirectorService, Resolution};
    use linkhop_storage::InMemoryLinkStore;
    use std::time::Duration;
    use tokio::sync::Barrier;

    /// Delegates to an in-memory store, optionally slowing writes down or
    /// reporting applied writes as timed out.
    #[derive(Debug, Default)]
    struct TestStore {
        inner: InMemoryLinkStore,
        write_delay: Option<Duration>,
        lose_write_acks: bool,
    }

    #[async_trait]
    impl ReadLinkStore for TestStore {
        async fn get_by_code(&self, code: &ShortCode) -> linkhop_core::store::Result<Option<Link>> {
            self.inner.get_by_code(code).await
        }

        async fn get_by_owner(&self, owner: &OwnerId) -> linkhop_core::store::Result<Vec<Link>> {
            self.inner.get_by_owner(owner).await
        }
    }

    #[async_trait]
    impl LinkStore for TestStore {
        async fn create(&self, link: NewLink) -> linkhop_core::store::Result<Link> {
            self.inner.create(link).await
        }

        async fn update(
            &self,
            id: LinkId,
            owner: &OwnerId,
            patch: LinkPatch,
        ) -> linkhop_core::store::Result<Link> {
            if let Some(delay) = self.write_delay {
                tokio::time::sleep(delay).await;
            }
            let link = self.inner.update(id, owner, patch).await?;
            if self.lose_write_acks {
                return Err(StorageError::Timeout("update exceeded 2s".to_string()));
            }
            Ok(link)
        }

        async fn delete(&self, id: LinkId, owner: &OwnerId) -> linkhop_core::store::Result<Link> {
            self.inner.delete(id, owner).await
        }
    }

    type Service = LinkService<TestStore, RandomGenerator, MokaLinkCache>;
    type Resolver = RedirectorService<TestStore, MokaLinkCache>;

    fn setup_with(store: TestStore) -> (Service, Resolver) {
        let store = Arc::new(store);
        let cache = MokaLinkCache::new();
        let service = LinkService::new(
            Arc::clone(&store),
            CodeAllocator::new(RandomGenerator::new()),
            cache.clone(),
        );
        let resolver = RedirectorService::new(store, cache);
        (service, resolver)
    }

    fn setup() -> (Service, Resolver) {
        setup_with(TestStore::default())
    }

    fn owner(id: &str) -> OwnerId {
        OwnerId::new(id).unwrap()
    }

    fn request(url: &str, custom_code: Option<&str>) -> CreateLink {
        CreateLink {
            title: "Example".to_string(),
            target_url: url.to_string(),
            custom_code: custom_code.map(str::to_string),
            visibility: Visibility::Public,
            tags: vec!["docs".to_string(), " ".to_string()],
        }
    }

    fn redirect(url: &str) -> Resolution {
        Resolution::Redirect(RedirectTarget {
            url: TargetUrl::parse(url).unwrap(),
        })
    }

    fn retarget(url: &str) -> UpdateLink {
        UpdateLink {
            target_url: Some(url.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_with_custom_code_resolves() {
        let (service, resolver) = setup();

        let link = service
            .create(&owner("alice"), request("https://example.com", Some("abc123")))
            .await
            .unwrap();

        assert_eq!(link.code.as_str(), "abc123");
        assert_eq!(link.tags, normalize_tags(["docs"]));
        assert_eq!(
            resolver.resolve(&link.code).await.unwrap(),
            redirect("https://example.com")
        );
    }

    #[tokio::test]
    async fn create_with_generated_code() {
        let (service, _) = setup();

        let link = service
            .create(&owner("alice"), request("https://example.com", None))
            .await
            .unwrap();

        assert_eq!(link.code.as_str().len(), RandomGenerator::DEFAULT_LENGTH);
    }

    #[tokio::test]
    async fn create_validates_input() {
        let (service, _) = setup();
        let alice = owner("alice");

        let err = service
            .create(&alice, request("not a url", None))
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::InvalidUrl(_)));

        let err = service
            .create(&alice, request("https://example.com", Some("bad code!")))
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::InvalidShortCode(_)));

        let mut untitled = request("https://example.com", None);
        untitled.title = " ".to_string();
        let err = service.create(&alice, untitled).await.unwrap_err();
        assert!(matches!(err, LinkError::InvalidTitle(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_of_one_code_admit_exactly_one() {
        let (service, _) = setup();
        let service = Arc::new(service);
        let barrier = Arc::new(Barrier::new(2));

        let a = tokio::spawn({
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            async move {
                barrier.wait().await;
                service
                    .create(&owner("alice"), request("https://a.example", Some("promo")))
                    .await
            }
        });
        let b = tokio::spawn({
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            async move {
                barrier.wait().await;
                service
                    .create(&owner("bob"), request("https://b.example", Some("promo")))
                    .await
            }
        });

        let results = [a.await.unwrap(), b.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(LinkError::CodeTaken(code)) if code == "promo"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn list_returns_only_own_links_newest_first() {
        let (service, _) = setup();
        let alice = owner("alice");

        for code in ["one", "two", "three"] {
            service
                .create(&alice, request("https://example.com", Some(code)))
                .await
                .unwrap();
        }
        service
            .create(&owner("bob"), request("https://example.com", Some("bobs")))
            .await
            .unwrap();

        let listing = service.list(&alice, &ListFilter::default()).await.unwrap();
        assert_eq!(listing.total, 3);
        let codes: Vec<&str> = listing.links.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["three", "two", "one"]);
    }

    #[tokio::test]
    async fn get_hides_other_owners_links() {
        let (service, _) = setup();
        let link = service
            .create(&owner("alice"), request("https://example.com", Some("mine")))
            .await
            .unwrap();

        assert_eq!(service.get(&owner("alice"), &link.code).await.unwrap(), link);
        assert!(matches!(
            service.get(&owner("bob"), &link.code).await,
            Err(LinkError::NotFound)
        ));
    }

    #[tokio::test]
    async fn update_is_visible_to_the_next_resolve() {
        let (service, resolver) = setup();
        let alice = owner("alice");
        let link = service
            .create(&alice, request("https://a.example", Some("moving")))
            .await
            .unwrap();
        assert_eq!(
            resolver.resolve(&link.code).await.unwrap(),
            redirect("https://a.example")
        );

        let updated = service
            .update(&alice, link.id, retarget("https://b.example"))
            .await
            .unwrap();

        assert_eq!(updated.code, link.code);
        assert_eq!(
            resolver.resolve(&link.code).await.unwrap(),
            redirect("https://b.example")
        );
    }

    #[tokio::test]
    async fn making_a_link_private_hides_it_immediately() {
        let (service, resolver) = setup();
        let alice = owner("alice");
        let link = service
            .create(&alice, request("https://example.com", Some("hideme")))
            .await
            .unwrap();
        resolver.resolve(&link.code).await.unwrap();

        let hide = UpdateLink {
            visibility: Some(Visibility::Private),
            ..Default::default()
        };
        service.update(&alice, link.id, hide).await.unwrap();

        assert_eq!(
            resolver.resolve(&link.code).await.unwrap(),
            Resolution::NotFound
        );
    }

    #[tokio::test]
    async fn delete_makes_cached_code_not_found() {
        let (service, resolver) = setup();
        let alice = owner("alice");
        let link = service
            .create(&alice, request("https://example.com", Some("gone")))
            .await
            .unwrap();
        resolver.resolve(&link.code).await.unwrap();

        let deleted = service.delete(&alice, link.id).await.unwrap();

        assert_eq!(deleted, link);
        assert_eq!(
            resolver.resolve(&link.code).await.unwrap(),
            Resolution::NotFound
        );
    }

    #[tokio::test]
    async fn only_the_owner_may_write() {
        let (service, resolver) = setup();
        let link = service
            .create(&owner("alice"), request("https://example.com", Some("owned")))
            .await
            .unwrap();
        let mallory = owner("mallory");

        let err = service
            .update(&mallory, link.id, retarget("https://evil.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::Forbidden));

        let err = service.delete(&mallory, link.id).await.unwrap_err();
        assert!(matches!(err, LinkError::Forbidden));

        assert_eq!(
            resolver.resolve(&link.code).await.unwrap(),
            redirect("https://example.com")
        );
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (service, _) = setup();

        let err = service
            .delete(&owner("alice"), LinkId::new(42))
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::NotFound));
    }

    #[tokio::test]
    async fn ambiguous_write_flushes_the_cache() {
        let (service, resolver) = setup_with(TestStore {
            lose_write_acks: true,
            ..Default::default()
        });
        let alice = owner("alice");
        let link = service
            .create(&alice, request("https://a.example", Some("flaky")))
            .await
            .unwrap();
        resolver.resolve(&link.code).await.unwrap();

        let err = service
            .update(&alice, link.id, retarget("https://b.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::StoreUnavailable(_)));

        // The write landed even though it was reported as timed out.
        assert_eq!(
            resolver.resolve(&link.code).await.unwrap(),
            redirect("https://b.example")
        );
    }

    #[tokio::test]
    async fn cancelled_update_still_invalidates() {
        let (service, resolver) = setup_with(TestStore {
            write_delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let alice = owner("alice");
        let link = service
            .create(&alice, request("https://a.example", Some("cancel")))
            .await
            .unwrap();
        resolver.resolve(&link.code).await.unwrap();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            service.update(&alice, link.id, retarget("https://b.example")),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(
            resolver.resolve(&link.code).await.unwrap(),
            redirect("https://b.example")
        );
    }
}
