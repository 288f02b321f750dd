use async_trait::async_trait;
use linkhop_core::{Link, LinkCache, ShortCode, StorageError};
use moka::future::Cache;
use std::collections::hash_map::RandomState;
use std::future::Future;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

/// Default maximum number of cached links.
pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;
/// Default staleness window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

const GENERATION_STRIPES: usize = 1024;
const MAX_LOAD_ROUNDS: usize = 4;

#[derive(Debug, Clone)]
struct Entry {
    link: Link,
    /// Generation of the key's stripe when the value was read from the store.
    generation: u64,
}

#[derive(Debug)]
enum LoadError {
    Absent { generation: u64 },
    Storage(StorageError),
}

/// An in-memory link cache backed by Moka.
///
/// Entries expire after a fixed time-to-live and the cache is bounded in
/// size. Misses are never stored.
///
/// Every key hashes onto one of a fixed set of generation counters.
/// [`LinkCache::invalidate`] bumps the counter before removing the entry, and
/// entries remember the counter value observed before their store read. An
/// entry whose generation is behind its stripe was populated from data that
/// may predate a write, and is treated as a miss. Keys sharing a stripe only
/// pay an extra reload.
///
/// Clones share the same underlying cache.
#[derive(Debug, Clone)]
pub struct MokaLinkCache {
    cache: Cache<String, Entry>,
    generations: Arc<[AtomicU64]>,
    hasher: RandomState,
}

impl MokaLinkCache {
    /// Creates a cache holding up to 10,000 links for one hour each.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    /// Creates a cache with custom capacity and time-to-live.
    ///
    /// Entries expire `ttl` after insertion, whether or not they are read.
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self {
            cache,
            generations: (0..GENERATION_STRIPES).map(|_| AtomicU64::new(0)).collect(),
            hasher: RandomState::new(),
        }
    }

    /// Returns a builder for creating a custom cache configuration.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfig::builder()
    }

    fn stripe(&self, code: &ShortCode) -> &AtomicU64 {
        let index = self.hasher.hash_one(code.as_str()) as usize % self.generations.len();
        &self.generations[index]
    }

    fn generation(&self, code: &ShortCode) -> u64 {
        self.stripe(code).load(Ordering::SeqCst)
    }
}

impl Default for MokaLinkCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkCache for MokaLinkCache {
    async fn get(&self, code: &ShortCode) -> Option<Link> {
        trace!(code = %code, "looking up link in cache");

        let entry = self.cache.get(code.as_str()).await?;
        if entry.generation == self.generation(code) {
            debug!(code = %code, "cache hit");
            Some(entry.link)
        } else {
            debug!(code = %code, "cache entry predates an invalidation");
            None
        }
    }

    async fn put(&self, code: &ShortCode, link: &Link) {
        let entry = Entry {
            link: link.clone(),
            generation: self.generation(code),
        };
        self.cache.insert(code.as_str().to_owned(), entry).await;
        trace!(code = %code, "cached link");
    }

    async fn invalidate(&self, code: &ShortCode) {
        // Bump first: even if this future is dropped before the removal below,
        // the old entry is already unreadable.
        self.stripe(code).fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate(code.as_str()).await;
        debug!(code = %code, "invalidated cache entry (if present)");
    }

    async fn invalidate_all(&self) {
        for generation in self.generations.iter() {
            generation.fetch_add(1, Ordering::SeqCst);
        }
        self.cache.invalidate_all();
        debug!("invalidated every cache entry");
    }

    async fn get_or_load<F, Fut>(
        &self,
        code: &ShortCode,
        load: F,
    ) -> Result<Option<Link>, StorageError>
    where
        F: Fn(ShortCode) -> Fut + Send + Sync,
        Fut: Future<Output = Result<Option<Link>, StorageError>> + Send,
    {
        let key = code.as_str().to_owned();

        for _ in 0..MAX_LOAD_ROUNDS {
            // Concurrent misses on one key share a single load. Only `Ok`
            // values are inserted, so absent codes and failures leave nothing
            // behind, and the insert itself is all-or-nothing.
            let loaded = self
                .cache
                .try_get_with(key.clone(), async {
                    let generation = self.generation(code);
                    trace!(code = %code, "cache miss, loading from store");
                    match load(code.clone()).await {
                        Ok(Some(link)) => Ok(Entry { link, generation }),
                        Ok(None) => Err(LoadError::Absent { generation }),
                        Err(err) => Err(LoadError::Storage(err)),
                    }
                })
                .await;

            let current = self.generation(code);
            match loaded {
                Ok(entry) if entry.generation == current => return Ok(Some(entry.link)),
                Ok(_) => {
                    debug!(code = %code, "discarding entry populated before an invalidation");
                    self.cache.invalidate(key.as_str()).await;
                }
                Err(err) => match err.as_ref() {
                    LoadError::Absent { generation } if *generation == current => {
                        trace!(code = %code, "code not found in store");
                        return Ok(None);
                    }
                    LoadError::Absent { .. } => {
                        debug!(code = %code, "miss raced an invalidation, reloading");
                    }
                    LoadError::Storage(err) => return Err(err.clone()),
                },
            }
        }

        // Writes to this stripe keep overtaking our loads; answer straight
        // from the store and leave the cache alone.
        debug!(code = %code, "bypassing cache after repeated invalidation races");
        load(code.clone()).await
    }
}

/// Configuration for creating a [`MokaLinkCache`] with custom settings.
#[derive(Debug, TypedBuilder)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold.
    #[builder(default = DEFAULT_MAX_CAPACITY)]
    max_capacity: u64,
    /// Time-to-live for cache entries.
    #[builder(default = DEFAULT_TTL)]
    ttl: Duration,
}

impl From<CacheConfig> for MokaLinkCache {
    fn from(config: CacheConfig) -> Self {
        MokaLinkCache::with_ttl(config.max_capacity, config.ttl)
    }
}
