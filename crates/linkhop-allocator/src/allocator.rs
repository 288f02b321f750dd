use crate::error::AllocationError;
use crate::generator::Generator;
use linkhop_core::{
    Link, LinkStore, NewLink, OwnerId, ShortCode, StorageError, TargetUrl, Title, Visibility,
};
use std::collections::BTreeSet;
use tracing::{debug, error, trace};

/// Default number of candidate codes tried before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Everything needed to store a link except its code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDraft {
    pub title: Title,
    pub target_url: TargetUrl,
    pub owner_id: OwnerId,
    pub visibility: Visibility,
    pub tags: BTreeSet<String>,
}

impl LinkDraft {
    pub fn with_code(self, code: ShortCode) -> NewLink {
        NewLink {
            code,
            title: self.title,
            target_url: self.target_url,
            owner_id: self.owner_id,
            visibility: self.visibility,
            tags: self.tags,
        }
    }
}

/// Assigns codes to new links.
///
/// Uniqueness is never checked up front: the store's atomic `create` is the
/// only arbiter, so two allocators racing for one code cannot both win.
#[derive(Debug, Clone)]
pub struct CodeAllocator<G> {
    generator: G,
    max_attempts: u32,
}

impl<G: Generator> CodeAllocator<G> {
    pub fn new(generator: G) -> Self {
        Self::with_max_attempts(generator, DEFAULT_MAX_ATTEMPTS)
    }

    /// Creates an allocator trying at most `max_attempts` codes per link.
    /// Values below one are raised to one.
    pub fn with_max_attempts(generator: G, max_attempts: u32) -> Self {
        Self {
            generator,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Stores `draft` under a freshly generated code.
    ///
    /// Collisions are retried with a new candidate; any other store error is
    /// returned as is.
    pub async fn allocate<S>(&self, store: &S, draft: LinkDraft) -> Result<Link, AllocationError>
    where
        S: LinkStore + ?Sized,
    {
        for attempt in 1..=self.max_attempts {
            let code = self.generator.generate();
            trace!(code = %code, attempt, "trying generated code");

            match store.create(draft.clone().with_code(code)).await {
                Ok(link) => return Ok(link),
                Err(StorageError::CodeTaken(code)) => {
                    debug!(code = %code, attempt, "generated code already taken");
                }
                Err(err) => return Err(AllocationError::Storage(err)),
            }
        }

        error!(
            attempts = self.max_attempts,
            "short code allocation exhausted, keyspace may be saturated"
        );
        Err(AllocationError::Exhausted {
            attempts: self.max_attempts,
        })
    }

    /// Stores `draft` under a caller-chosen code.
    ///
    /// A taken code fails immediately with [`AllocationError::CodeTaken`].
    pub async fn claim<S>(
        &self,
        store: &S,
        code: ShortCode,
        draft: LinkDraft,
    ) -> Result<Link, AllocationError>
    where
        S: LinkStore + ?Sized,
    {
        match store.create(draft.with_code(code)).await {
            Ok(link) => Ok(link),
            Err(StorageError::CodeTaken(code)) => {
                debug!(code = %code, "custom code already taken");
                Err(AllocationError::CodeTaken(code))
            }
            Err(err) => Err(AllocationError::Storage(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::random::RandomGenerator;
    use async_trait::async_trait;
    use linkhop_core::{LinkId, LinkPatch, ReadLinkStore};
    use linkhop_storage::InMemoryLinkStore;
    use rand::Rng;
    use std::collections::{HashSet, VecDeque};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Barrier;

    /// Hands out a fixed sequence of codes, then repeats the last one.
    struct ScriptedGenerator {
        codes: Mutex<VecDeque<&'static str>>,
        last: &'static str,
    }

    impl ScriptedGenerator {
        fn new(codes: &[&'static str]) -> Self {
            Self {
                codes: Mutex::new(codes.iter().copied().collect()),
                last: codes.last().copied().unwrap_or("fallback"),
            }
        }
    }

    impl Generator for ScriptedGenerator {
        fn generate(&self) -> ShortCode {
            let next = self.codes.lock().unwrap().pop_front().unwrap_or(self.last);
            ShortCode::new_unchecked(next)
        }
    }

    /// Picks from a deliberately tiny keyspace to force collisions.
    struct TinyKeyspace(u32);

    impl Generator for TinyKeyspace {
        fn generate(&self) -> ShortCode {
            let n = rand::thread_rng().gen_range(0..self.0);
            ShortCode::new_unchecked(format!("k{}", n))
        }
    }

    struct UnavailableStore;

    #[async_trait]
    impl ReadLinkStore for UnavailableStore {
        async fn get_by_code(&self, _code: &ShortCode) -> linkhop_core::store::Result<Option<Link>> {
            Err(StorageError::Unavailable("down".to_string()))
        }

        async fn get_by_owner(&self, _owner: &OwnerId) -> linkhop_core::store::Result<Vec<Link>> {
            Err(StorageError::Unavailable("down".to_string()))
        }
    }

    #[async_trait]
    impl LinkStore for UnavailableStore {
        async fn create(&self, _link: NewLink) -> linkhop_core::store::Result<Link> {
            Err(StorageError::Unavailable("down".to_string()))
        }

        async fn update(
            &self,
            _id: LinkId,
            _owner: &OwnerId,
            _patch: LinkPatch,
        ) -> linkhop_core::store::Result<Link> {
            Err(StorageError::Unavailable("down".to_string()))
        }

        async fn delete(&self, _id: LinkId, _owner: &OwnerId) -> linkhop_core::store::Result<Link> {
            Err(StorageError::Unavailable("down".to_string()))
        }
    }

    fn draft(url: &str) -> LinkDraft {
        LinkDraft {
            title: Title::new("Example").unwrap(),
            target_url: TargetUrl::parse(url).unwrap(),
            owner_id: OwnerId::new("alice").unwrap(),
            visibility: Visibility::Public,
            tags: BTreeSet::new(),
        }
    }

    async fn seed(store: &InMemoryLinkStore, code: &str) {
        let code = ShortCode::new_unchecked(code);
        store
            .create(draft("https://seed.example").with_code(code))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn allocate_uses_first_free_code() {
        let store = InMemoryLinkStore::new();
        let allocator = CodeAllocator::new(ScriptedGenerator::new(&["aaaa", "bbbb"]));

        let link = allocator
            .allocate(&store, draft("https://example.com"))
            .await
            .unwrap();

        assert_eq!(link.code.as_str(), "aaaa");
        assert_eq!(link.target_url.as_str(), "https://example.com");
    }

    #[tokio::test]
    async fn allocate_retries_past_taken_codes() {
        let store = InMemoryLinkStore::new();
        seed(&store, "aaaa").await;
        seed(&store, "bbbb").await;
        let allocator = CodeAllocator::new(ScriptedGenerator::new(&["aaaa", "bbbb", "cccc"]));

        let link = allocator
            .allocate(&store, draft("https://example.com"))
            .await
            .unwrap();

        assert_eq!(link.code.as_str(), "cccc");
    }

    #[tokio::test]
    async fn allocate_gives_up_after_max_attempts() {
        let store = InMemoryLinkStore::new();
        seed(&store, "taken").await;
        let allocator = CodeAllocator::with_max_attempts(ScriptedGenerator::new(&["taken"]), 3);

        let err = allocator
            .allocate(&store, draft("https://example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, AllocationError::Exhausted { attempts: 3 }));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn allocate_propagates_store_failures_without_retrying() {
        let allocator = CodeAllocator::new(RandomGenerator::new());

        let err = allocator
            .allocate(&UnavailableStore, draft("https://example.com"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AllocationError::Storage(StorageError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn claim_stores_custom_code() {
        let store = InMemoryLinkStore::new();
        let allocator = CodeAllocator::new(RandomGenerator::new());

        let link = allocator
            .claim(
                &store,
                ShortCode::new("abc123").unwrap(),
                draft("https://example.com"),
            )
            .await
            .unwrap();

        assert_eq!(link.code.as_str(), "abc123");
        let stored = store
            .get_by_code(&ShortCode::new("abc123").unwrap())
            .await
            .unwrap();
        assert_eq!(stored, Some(link));
    }

    #[tokio::test]
    async fn claim_of_taken_code_fails_without_retry() {
        let store = InMemoryLinkStore::new();
        seed(&store, "promo").await;
        let allocator = CodeAllocator::new(RandomGenerator::new());

        let err = allocator
            .claim(
                &store,
                ShortCode::new("promo").unwrap(),
                draft("https://example.com"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AllocationError::CodeTaken(code) if code == "promo"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_allocations_never_share_a_code() {
        let store = Arc::new(InMemoryLinkStore::new());
        let allocator = Arc::new(CodeAllocator::with_max_attempts(TinyKeyspace(100), 1000));
        let barrier = Arc::new(Barrier::new(50));

        let mut handles = vec![];
        for i in 0..50 {
            let store = Arc::clone(&store);
            let allocator = Arc::clone(&allocator);
            let barrier = Arc::clone(&barrier);
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                allocator
                    .allocate(store.as_ref(), draft(&format!("https://example.com/{}", i)))
                    .await
            }));
        }

        let mut codes = HashSet::new();
        for handle in handles {
            let link = handle.await.unwrap().unwrap();
            assert!(codes.insert(link.code), "code handed out twice");
        }

        assert_eq!(codes.len(), 50);
        assert_eq!(store.len(), 50);
    }

    #[test]
    fn zero_attempts_is_raised_to_one() {
        let allocator = CodeAllocator::with_max_attempts(RandomGenerator::new(), 0);
        assert_eq!(allocator.max_attempts(), 1);
    }
}
