//! Single-value queries bound to a cache key

use crate::cache::{CachePolicy, QueryCache};
use crate::state::QueryState;
use crate::QueryKey;
use futures::future::BoxFuture;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

pub(crate) type Fetcher<T, E> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// A keyed read through the cache
///
/// Disabled queries never reach the network; `run` returns `None` and the
/// state stays idle.
pub struct Query<T, E> {
    cache: QueryCache,
    key: QueryKey,
    fetcher: Fetcher<T, E>,
    enabled: bool,
    policy: CachePolicy,
}

impl<T, E> Clone for Query<T, E> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            key: self.key.clone(),
            fetcher: Arc::clone(&self.fetcher),
            enabled: self.enabled,
            policy: self.policy,
        }
    }
}

impl<T, E> Query<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Display,
{
    pub fn new<F>(cache: &QueryCache, key: QueryKey, fetcher: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync + 'static,
    {
        Self {
            cache: cache.clone(),
            key,
            fetcher: Arc::new(fetcher),
            enabled: true,
            policy: CachePolicy::default(),
        }
    }

    /// Gate the query on a precondition, e.g. a non-empty id
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_stale_time(mut self, stale_after: Duration) -> Self {
        self.policy = CachePolicy {
            stale_after: Some(stale_after),
        };
        self
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Resolve through the cache; `None` when disabled
    pub async fn run(&self) -> Option<Result<T, E>> {
        if !self.enabled {
            return None;
        }
        let fetcher = Arc::clone(&self.fetcher);
        Some(
            self.cache
                .fetch_query_with(&self.key, self.policy, move || fetcher())
                .await,
        )
    }

    /// Resolve, then report the resulting state
    pub async fn fetch(&self) -> QueryState<T> {
        if self.run().await.is_none() {
            return QueryState::idle();
        }
        self.state()
    }

    pub fn state(&self) -> QueryState<T> {
        if !self.enabled {
            return QueryState::idle();
        }
        self.cache.state::<T>(&self.key)
    }

    /// Cached value without fetching
    pub fn data(&self) -> Option<T> {
        self.cache.get_query_data::<T>(&self.key)
    }
}
