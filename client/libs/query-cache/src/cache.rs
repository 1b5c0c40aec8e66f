//! In-memory query cache
//!
//! **Architecture**:
//! - One entry per [`QueryKey`], holding type-erased data plus status
//! - Reads for one key are serialized through a per-key async lock, so
//!   concurrent consumers share a single fetch
//! - Writers are not serialized: the last write to settle wins
//! - Invalidation marks entries stale; stale data stays readable until the
//!   refetch resolves

use crate::invalidation::{InvalidationAction, InvalidationEvent, EVENT_CHANNEL_CAPACITY};
use crate::state::{QueryState, QueryStatus};
use crate::stats::{CacheStats, StatsCollector};
use crate::QueryKey;
use dashmap::DashMap;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

/// Freshness policy for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Data older than this is refetched; `None` keeps it until invalidated
    pub stale_after: Option<Duration>,
}

impl CachePolicy {
    /// Fresh until a mutation invalidates it
    pub const UNTIL_INVALIDATED: Self = Self { stale_after: None };

    /// Always refetch on read
    pub const ALWAYS_STALE: Self = Self {
        stale_after: Some(Duration::ZERO),
    };
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::UNTIL_INVALIDATED
    }
}

type AnyData = Arc<dyn Any + Send + Sync>;

/// Cached entry with status metadata
struct CacheEntry {
    data: Option<AnyData>,
    status: QueryStatus,
    error: Option<String>,
    is_fetching: bool,
    invalidated: bool,
    updated_at: Option<Instant>,
    policy: CachePolicy,
    /// Bumped by every invalidation; a fetch that started under an older
    /// generation stores its data as stale
    generation: u64,
}

impl CacheEntry {
    fn empty() -> Self {
        Self {
            data: None,
            status: QueryStatus::Idle,
            error: None,
            is_fetching: false,
            invalidated: false,
            updated_at: None,
            policy: CachePolicy::default(),
            generation: 0,
        }
    }

    fn is_stale(&self) -> bool {
        if self.invalidated {
            return true;
        }
        match (self.policy.stale_after, self.updated_at) {
            (Some(limit), Some(at)) => at.elapsed() >= limit,
            (_, None) => true,
            (None, Some(_)) => false,
        }
    }

    fn typed<T: Clone + 'static>(&self) -> Option<T> {
        self.data
            .as_ref()
            .and_then(|data| data.downcast_ref::<T>())
            .cloned()
    }
}

/// Handed out when a fetch starts; checked again when it stores its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FetchTicket {
    /// Cache-wide epoch, bumped by `remove` and `clear`
    epoch: u64,
    /// Entry generation, bumped by invalidation
    generation: u64,
}

struct Inner {
    store: DashMap<QueryKey, CacheEntry>,
    epoch: AtomicU64,
    locks: DashMap<QueryKey, Arc<Mutex<()>>>,
    events: broadcast::Sender<InvalidationEvent>,
    stats: StatsCollector,
}

/// Shared query cache
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store: DashMap::new(),
                epoch: AtomicU64::new(0),
                locks: DashMap::new(),
                events,
                stats: StatsCollector::default(),
            }),
        }
    }

    /// Return fresh cached data or run the fetcher
    ///
    /// **Flow**:
    /// 1. Fresh entry → return it
    /// 2. Wait for any in-flight fetch of the same key, re-check
    /// 3. Run fetcher, store result (or error, keeping old data)
    pub async fn fetch_query<T, E, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.fetch_query_with(key, CachePolicy::default(), fetcher)
            .await
    }

    /// [`fetch_query`](Self::fetch_query) with an explicit freshness policy
    pub async fn fetch_query_with<T, E, F, Fut>(
        &self,
        key: &QueryKey,
        policy: CachePolicy,
        fetcher: F,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        // Fast path: no lock needed for a fresh hit
        if let Some(value) = self.fresh::<T>(key) {
            self.inner.stats.record_hit();
            debug!(key = %key, "Query cache HIT");
            return Ok(value);
        }

        let lock = self.key_lock(key);
        let _guard = lock.lock().await;

        // Another consumer may have fetched while we waited
        if let Some(value) = self.fresh::<T>(key) {
            self.inner.stats.record_hit();
            debug!(key = %key, "Query cache HIT after wait");
            return Ok(value);
        }

        self.inner.stats.record_miss();
        debug!(key = %key, "Query cache MISS");

        let ticket = self.begin_fetch(key);

        match fetcher().await {
            Ok(value) => {
                self.store_success(key, value.clone(), policy, ticket);
                Ok(value)
            }
            Err(e) => {
                self.record_error(key, e.to_string());
                Err(e)
            }
        }
    }

    /// Cached data for a key, fresh or stale
    pub fn get_query_data<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.inner.store.get(key).and_then(|entry| entry.typed::<T>())
    }

    /// Write data directly; it is fresh until invalidated
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey, value: T) {
        let mut entry = self
            .inner
            .store
            .entry(key.clone())
            .or_insert_with(CacheEntry::empty);
        entry.data = Some(Arc::new(value));
        entry.status = QueryStatus::Success;
        entry.error = None;
        entry.invalidated = false;
        entry.updated_at = Some(Instant::now());
    }

    /// Snapshot of a key's state as type `T`
    pub fn state<T: Clone + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        match self.inner.store.get(key) {
            Some(entry) => QueryState {
                status: entry.status,
                data: entry.typed::<T>(),
                error: entry.error.clone(),
                is_fetching: entry.is_fetching,
                is_stale: entry.is_stale(),
            },
            None => QueryState::idle(),
        }
    }

    /// True when the key holds data that will not be refetched on read
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.inner
            .store
            .get(key)
            .map(|entry| entry.data.is_some() && !entry.is_stale())
            .unwrap_or(false)
    }

    /// Mark every entry under `prefix` stale
    ///
    /// Returns the number of entries matched. An event is broadcast even
    /// when nothing matched, so live consumers can still refetch.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        self.invalidate_from(prefix, None)
    }

    /// [`invalidate`](Self::invalidate) recording the triggering source
    pub fn invalidate_from(&self, prefix: &QueryKey, source: Option<&str>) -> usize {
        let mut matched = 0;
        for mut entry in self.inner.store.iter_mut() {
            if prefix.is_prefix_of(entry.key()) {
                entry.invalidated = true;
                entry.generation += 1;
                matched += 1;
            }
        }

        self.inner.stats.record_invalidations(matched);
        debug!(key = %prefix, matched, source = ?source, "Query cache INVALIDATE");
        self.publish(InvalidationEvent::new(
            Some(prefix.clone()),
            matched,
            InvalidationAction::Stale,
            source,
        ));
        matched
    }

    /// Invalidate several prefixes, returning the total matched
    pub fn invalidate_many(&self, prefixes: &[QueryKey], source: Option<&str>) -> usize {
        prefixes
            .iter()
            .map(|prefix| self.invalidate_from(prefix, source))
            .sum()
    }

    /// Drop every entry under `prefix`
    pub fn remove(&self, prefix: &QueryKey) -> usize {
        let keys: Vec<QueryKey> = self
            .inner
            .store
            .iter()
            .filter(|entry| prefix.is_prefix_of(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        for key in &keys {
            self.inner.store.remove(key);
        }

        debug!(key = %prefix, removed = keys.len(), "Query cache REMOVE");
        self.publish(InvalidationEvent::new(
            Some(prefix.clone()),
            keys.len(),
            InvalidationAction::Remove,
            None,
        ));
        keys.len()
    }

    /// Drop all entries
    pub fn clear(&self) {
        let count = self.inner.store.len();
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        self.inner.store.clear();
        self.inner.locks.clear();
        debug!(cleared_entries = count, "Query cache CLEAR");
        self.publish(InvalidationEvent::new(
            None,
            count,
            InvalidationAction::Clear,
            None,
        ));
    }

    /// Receive invalidation events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationEvent> {
        self.inner.events.subscribe()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot(self.inner.store.len())
    }

    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    /// Record a failed fetch; existing data is kept
    pub(crate) fn record_error(&self, key: &QueryKey, message: String) {
        self.inner.stats.record_error();
        warn!(key = %key, error = %message, "Query fetch failed");

        let mut entry = self
            .inner
            .store
            .entry(key.clone())
            .or_insert_with(CacheEntry::empty);
        entry.status = QueryStatus::Error;
        entry.error = Some(message);
        entry.is_fetching = false;
    }

    pub(crate) fn begin_fetch(&self, key: &QueryKey) -> FetchTicket {
        let epoch = self.inner.epoch.load(Ordering::SeqCst);
        let mut entry = self
            .inner
            .store
            .entry(key.clone())
            .or_insert_with(CacheEntry::empty);
        entry.is_fetching = true;
        if entry.data.is_none() {
            entry.status = QueryStatus::Loading;
        }
        FetchTicket {
            epoch,
            generation: entry.generation,
        }
    }

    pub(crate) fn store_success<T: Send + Sync + 'static>(
        &self,
        key: &QueryKey,
        value: T,
        policy: CachePolicy,
        ticket: FetchTicket,
    ) {
        // Removed or cleared while in flight: the result belongs to a
        // discarded cache state and is not stored
        if self.inner.epoch.load(Ordering::SeqCst) != ticket.epoch {
            debug!(key = %key, "Dropping result of a fetch that outlived a clear");
            return;
        }

        let mut entry = self
            .inner
            .store
            .entry(key.clone())
            .or_insert_with(CacheEntry::empty);
        entry.data = Some(Arc::new(value));
        entry.status = QueryStatus::Success;
        entry.error = None;
        entry.is_fetching = false;
        entry.updated_at = Some(Instant::now());
        entry.policy = policy;
        // Invalidated while in flight: keep the data but refetch next read
        entry.invalidated = entry.generation != ticket.generation;
    }

    fn fresh<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.inner.store.get(key)?;
        if entry.is_stale() {
            return None;
        }
        let value = entry.typed::<T>();
        if value.is_none() && entry.data.is_some() {
            warn!(key = %key, "Cached data has a different type, refetching");
        }
        value
    }

    fn key_lock(&self, key: &QueryKey) -> Arc<Mutex<()>> {
        self.inner
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn publish(&self, event: InvalidationEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(root: &str) -> QueryKey {
        QueryKey::new(root)
    }

    #[tokio::test]
    async fn test_cache_hit() {
        let cache = QueryCache::new();
        let k = key("getRecentPosts");

        let first: Result<String, String> = cache
            .fetch_query(&k, || async { Ok("posts".to_string()) })
            .await;
        assert_eq!(first.unwrap(), "posts");

        // Second call: hit (no execution)
        let executed = AtomicUsize::new(0);
        let second: Result<String, String> = cache
            .fetch_query(&k, || async {
                executed.fetch_add(1, Ordering::SeqCst);
                Ok("refetched".to_string())
            })
            .await;
        assert_eq!(second.unwrap(), "posts");
        assert_eq!(executed.load(Ordering::SeqCst), 0);
        assert_eq!(cache.stats().hit_count, 1);
        assert_eq!(cache.stats().miss_count, 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch_and_keeps_stale_data() {
        let cache = QueryCache::new();
        let k = key("getCurrentUser");
        cache
            .fetch_query::<_, String, _, _>(&k, || async { Ok(1u32) })
            .await
            .unwrap();

        assert_eq!(cache.invalidate(&k), 1);

        let state = cache.state::<u32>(&k);
        assert!(state.is_stale);
        assert_eq!(state.data, Some(1));

        let refreshed = cache
            .fetch_query::<_, String, _, _>(&k, || async { Ok(2u32) })
            .await
            .unwrap();
        assert_eq!(refreshed, 2);
        assert!(cache.is_fresh(&k));
    }

    #[tokio::test]
    async fn test_prefix_invalidation_leaves_siblings() {
        let cache = QueryCache::new();
        cache.set_query_data(&key("getPostById").with("1"), 1u8);
        cache.set_query_data(&key("getPostById").with("2"), 2u8);
        cache.set_query_data(&key("getUsers"), 3u8);

        let matched = cache.invalidate(&key("getPostById").with("1"));

        assert_eq!(matched, 1);
        assert!(!cache.is_fresh(&key("getPostById").with("1")));
        assert!(cache.is_fresh(&key("getPostById").with("2")));
        assert!(cache.is_fresh(&key("getUsers")));
    }

    #[tokio::test]
    async fn test_error_keeps_previous_data() {
        let cache = QueryCache::new();
        let k = key("getUsers");
        cache.set_query_data(&k, vec![1u8]);
        cache.invalidate(&k);

        let result: Result<Vec<u8>, String> = cache
            .fetch_query(&k, || async { Err("offline".to_string()) })
            .await;

        assert!(result.is_err());
        let state = cache.state::<Vec<u8>>(&k);
        assert!(state.is_error());
        assert_eq!(state.error.as_deref(), Some("offline"));
        assert_eq!(state.data, Some(vec![1u8]));
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_fetch() {
        let cache = QueryCache::new();
        let k = key("getRecentPosts");
        let calls = Arc::new(AtomicUsize::new(0));

        let fetch = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, String>(7u32)
        };

        let (a, b) = tokio::join!(
            cache.fetch_query(&k, || fetch(calls.clone())),
            cache.fetch_query(&k, || fetch(calls.clone())),
        );

        assert_eq!(a.unwrap(), 7);
        assert_eq!(b.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidated_during_fetch_stays_stale() {
        let cache = QueryCache::new();
        let k = key("getPosts");
        let inner = cache.clone();
        let k2 = k.clone();

        let value = cache
            .fetch_query::<_, String, _, _>(&k, || async move {
                // A mutation lands while this read is in flight
                inner.invalidate(&k2);
                Ok(5u32)
            })
            .await
            .unwrap();

        assert_eq!(value, 5);
        assert!(!cache.is_fresh(&k));
    }

    #[tokio::test]
    async fn test_cleared_during_fetch_is_not_cached() {
        let cache = QueryCache::new();
        let k = key("getCurrentUser");
        let inner = cache.clone();

        let value = cache
            .fetch_query::<_, String, _, _>(&k, || async move {
                // Sign-out clears the cache while this read is in flight
                inner.clear();
                Ok("old-user".to_string())
            })
            .await
            .unwrap();

        assert_eq!(value, "old-user");
        assert!(!cache.is_fresh(&k));
        assert_eq!(cache.get_query_data::<String>(&k), None);

        // Next read goes back to the fetcher
        let next = cache
            .fetch_query::<_, String, _, _>(&k, || async { Ok("new-user".to_string()) })
            .await
            .unwrap();
        assert_eq!(next, "new-user");
        assert!(cache.is_fresh(&k));
    }

    #[tokio::test]
    async fn test_removed_during_fetch_is_not_cached() {
        let cache = QueryCache::new();
        let k = key("getPostById").with("p1");
        let inner = cache.clone();
        let prefix = key("getPostById");

        cache
            .fetch_query::<_, String, _, _>(&k, || async move {
                inner.remove(&prefix);
                Ok(1u8)
            })
            .await
            .unwrap();

        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_stale_after_policy() {
        let cache = QueryCache::new();
        let k = key("searchPosts");

        cache
            .fetch_query_with::<_, String, _, _>(&k, CachePolicy::ALWAYS_STALE, || async {
                Ok(1u8)
            })
            .await
            .unwrap();

        assert!(!cache.is_fresh(&k));
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let cache = QueryCache::new();
        let mut events = cache.subscribe();

        cache.invalidate_from(&key("getRecentPosts"), Some("createPost"));

        let event = events.recv().await.unwrap();
        assert_eq!(event.key, Some(key("getRecentPosts")));
        assert_eq!(event.source.as_deref(), Some("createPost"));
        assert_eq!(event.action, InvalidationAction::Stale);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = QueryCache::new();
        cache.set_query_data(&key("getUserById").with("a"), 1u8);
        cache.set_query_data(&key("getUserById").with("b"), 2u8);
        cache.set_query_data(&key("getUsers"), 3u8);

        assert_eq!(cache.remove(&key("getUserById")), 2);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.state::<u8>(&key("getUsers")).data.is_none());
    }

    #[test]
    fn test_type_mismatch_reads_as_none() {
        let cache = QueryCache::new();
        cache.set_query_data(&key("getUsers"), 3u8);
        assert_eq!(cache.get_query_data::<String>(&key("getUsers")), None);
        assert_eq!(cache.get_query_data::<u8>(&key("getUsers")), Some(3));
    }
}
