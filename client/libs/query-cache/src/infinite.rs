//! Cursor-paginated queries
//!
//! Pages accumulate under one key. After invalidation the whole chain is
//! refetched from the first cursor, up to the number of pages already
//! loaded, so the consumer sees a consistent list.

use crate::cache::{CachePolicy, QueryCache};
use crate::state::QueryState;
use crate::QueryKey;
use futures::future::BoxFuture;
use std::fmt::Display;
use std::sync::Arc;
use tracing::debug;

type PageFetcher<P, E> =
    Arc<dyn Fn(Option<String>) -> BoxFuture<'static, Result<P, E>> + Send + Sync>;
type NextParam<P> = Arc<dyn Fn(&P) -> Option<String> + Send + Sync>;

/// Accumulated pages of an infinite query
#[derive(Debug, Clone, PartialEq)]
pub struct InfiniteData<P> {
    pub pages: Vec<P>,
    /// Cursor each page was fetched with (`None` for the first)
    pub page_params: Vec<Option<String>>,
    /// Cursor for the next page; `None` once the end is reached
    pub next_page_param: Option<String>,
}

impl<P> InfiniteData<P> {
    pub fn has_next_page(&self) -> bool {
        self.next_page_param.is_some()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Infinite query over a cursor-paginated source
pub struct InfiniteQuery<P, E> {
    cache: QueryCache,
    key: QueryKey,
    fetch_page: PageFetcher<P, E>,
    next_param: NextParam<P>,
}

impl<P, E> Clone for InfiniteQuery<P, E> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            key: self.key.clone(),
            fetch_page: Arc::clone(&self.fetch_page),
            next_param: Arc::clone(&self.next_param),
        }
    }
}

impl<P, E> InfiniteQuery<P, E>
where
    P: Clone + Send + Sync + 'static,
    E: Display,
{
    /// `fetch_page` receives the cursor (`None` for the first page);
    /// `next_param` derives the following cursor from a page
    pub fn new<F, N>(cache: &QueryCache, key: QueryKey, fetch_page: F, next_param: N) -> Self
    where
        F: Fn(Option<String>) -> BoxFuture<'static, Result<P, E>> + Send + Sync + 'static,
        N: Fn(&P) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            cache: cache.clone(),
            key,
            fetch_page: Arc::new(fetch_page),
            next_param: Arc::new(next_param),
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Load the first page, or refetch every loaded page if stale
    pub async fn load(&self) -> Result<InfiniteData<P>, E> {
        let target_pages = self
            .data()
            .map(|data| data.page_count())
            .unwrap_or(0)
            .max(1);

        let fetch_page = Arc::clone(&self.fetch_page);
        let next_param = Arc::clone(&self.next_param);
        let key = self.key.clone();

        self.cache
            .fetch_query_with(&self.key, CachePolicy::default(), move || async move {
                let mut data = InfiniteData {
                    pages: Vec::with_capacity(target_pages),
                    page_params: Vec::with_capacity(target_pages),
                    next_page_param: None,
                };
                let mut cursor: Option<String> = None;

                while data.pages.len() < target_pages {
                    let page = fetch_page(cursor.clone()).await?;
                    let next = next_param(&page);
                    data.page_params.push(cursor.take());
                    data.pages.push(page);
                    data.next_page_param = next.clone();
                    match next {
                        Some(next) => cursor = Some(next),
                        None => break,
                    }
                }

                debug!(key = %key, pages = data.pages.len(), "Infinite query loaded");
                Ok(data)
            })
            .await
    }

    /// Fetch and append the page after the last loaded one
    ///
    /// No-op when the end has been reached.
    pub async fn fetch_next_page(&self) -> Result<InfiniteData<P>, E> {
        // Stale or missing pages are reloaded before appending
        let current = self.load().await?;

        let cursor = match current.next_page_param.clone() {
            Some(cursor) => cursor,
            None => return Ok(current),
        };

        let ticket = self.cache.begin_fetch(&self.key);
        match (self.fetch_page)(Some(cursor.clone())).await {
            Ok(page) => {
                // Re-read: a concurrent refetch may have replaced the pages
                let mut data = self.data().unwrap_or(current);
                data.next_page_param = (self.next_param)(&page);
                data.page_params.push(Some(cursor));
                data.pages.push(page);
                self.cache
                    .store_success(&self.key, data.clone(), CachePolicy::default(), ticket);
                debug!(key = %self.key, pages = data.pages.len(), "Fetched next page");
                Ok(data)
            }
            Err(e) => {
                self.cache.record_error(&self.key, e.to_string());
                Err(e)
            }
        }
    }

    pub fn data(&self) -> Option<InfiniteData<P>> {
        self.cache.get_query_data::<InfiniteData<P>>(&self.key)
    }

    pub fn state(&self) -> QueryState<InfiniteData<P>> {
        self.cache.state::<InfiniteData<P>>(&self.key)
    }

    /// False before the first load and after the last page
    pub fn has_next_page(&self) -> bool {
        self.data().map(|data| data.has_next_page()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source of `total` items served `size` at a time, cursor = last item
    fn numbered(
        cache: &QueryCache,
        total: usize,
        size: usize,
        calls: Arc<AtomicUsize>,
    ) -> InfiniteQuery<Vec<usize>, String> {
        InfiniteQuery::new(
            cache,
            QueryKey::new("getInfinitePosts"),
            move |cursor: Option<String>| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let start = match cursor {
                        Some(c) => c.parse::<usize>().map_err(|e| e.to_string())? + 1,
                        None => 0,
                    };
                    Ok::<Vec<usize>, String>((start..total).take(size).collect())
                }
                .boxed()
            },
            |page: &Vec<usize>| page.last().map(|n| n.to_string()),
        )
    }

    #[tokio::test]
    async fn test_pages_enumerate_every_item_once() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let query = numbered(&cache, 25, 10, calls.clone());

        query.load().await.unwrap();
        while query.has_next_page() {
            query.fetch_next_page().await.unwrap();
        }

        let data = query.data().unwrap();
        let items: Vec<usize> = data.pages.concat();
        assert_eq!(items, (0..25).collect::<Vec<_>>());
        // 10 + 10 + 5 + trailing empty page
        assert_eq!(data.page_count(), 4);
        assert!(data.pages.last().unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_empty_first_page_has_no_next() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let query = numbered(&cache, 0, 10, calls.clone());

        let data = query.load().await.unwrap();
        assert!(!data.has_next_page());

        // No more pages: nothing fetched
        query.fetch_next_page().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidation_refetches_loaded_pages_from_start() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let query = numbered(&cache, 50, 10, calls.clone());

        query.load().await.unwrap();
        query.fetch_next_page().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cache.invalidate(&QueryKey::new("getInfinitePosts"));
        let data = query.load().await.unwrap();

        assert_eq!(data.page_count(), 2);
        assert_eq!(data.page_params, vec![None, Some("9".to_string())]);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_fresh_load_is_served_from_cache() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let query = numbered(&cache, 50, 10, calls.clone());

        query.load().await.unwrap();
        query.load().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
