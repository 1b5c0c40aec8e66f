//! Explore screen controller
//!
//! Two mutually exclusive modes, chosen only by the debounced search term:
//! an empty term shows the paginated feed, anything else shows search
//! results. Scrolling the sentinel into view loads the next feed page.

use crate::debounce::Debouncer;
use crate::queries::{PostPage, SnapgramQueries};
use appwrite_facade::PostDocument;
use error_types::{ClientError, ClientResult};
use query_cache::{InfiniteData, InfiniteQuery, QueryStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayMode {
    Feed,
    Search(String),
}

/// What the explore screen should render
#[derive(Debug, Clone, PartialEq)]
pub enum ExploreView {
    Loading,
    /// Posts matching `term`; an empty list renders "No results found"
    SearchResults {
        term: String,
        posts: Vec<PostDocument>,
    },
    /// Feed loaded but every page is empty
    EndOfPosts,
    Feed {
        posts: Vec<PostDocument>,
        has_next_page: bool,
    },
}

pub struct ExploreController {
    queries: Arc<SnapgramQueries>,
    feed: InfiniteQuery<PostPage, ClientError>,
    search: Debouncer<String>,
}

impl ExploreController {
    /// Must be created inside a tokio runtime (the debouncer spawns a task)
    pub fn new(queries: Arc<SnapgramQueries>, debounce: Duration) -> Self {
        let feed = queries.infinite_posts();
        Self {
            queries,
            feed,
            search: Debouncer::new(String::new(), debounce),
        }
    }

    // ===== Input =====

    pub fn set_search_input(&self, text: impl Into<String>) {
        self.search.set(text.into());
    }

    pub fn search_input(&self) -> String {
        self.search.raw()
    }

    /// Receiver that wakes on each debounced term change
    pub fn subscribe_search(&self) -> watch::Receiver<String> {
        self.search.subscribe()
    }

    pub fn mode(&self) -> DisplayMode {
        let term = self.search.value();
        if term.is_empty() {
            DisplayMode::Feed
        } else {
            DisplayMode::Search(term)
        }
    }

    // ===== Loading =====

    /// Fetch whatever the current mode needs, then describe the screen
    pub async fn load(&self) -> ClientResult<ExploreView> {
        match self.mode() {
            DisplayMode::Feed => {
                let data = self.feed.load().await?;
                Ok(Self::feed_view(&data))
            }
            DisplayMode::Search(term) => {
                let posts = self.search_results_for(&term).await?;
                Ok(ExploreView::SearchResults { term, posts })
            }
        }
    }

    /// Visibility signal from the end-of-list sentinel
    ///
    /// Fetches the next feed page only in feed mode, while the sentinel is
    /// visible and more pages remain. Returns whether a fetch happened.
    pub async fn on_visibility(&self, visible: bool) -> ClientResult<bool> {
        if !visible || self.mode() != DisplayMode::Feed || !self.feed.has_next_page() {
            return Ok(false);
        }
        let data = self.feed.fetch_next_page().await?;
        debug!(pages = data.page_count(), "Explore feed extended");
        Ok(true)
    }

    /// Results for the current debounced term; empty in feed mode
    pub async fn search_results(&self) -> ClientResult<Vec<PostDocument>> {
        match self.mode() {
            DisplayMode::Feed => Ok(Vec::new()),
            DisplayMode::Search(term) => self.search_results_for(&term).await,
        }
    }

    async fn search_results_for(&self, term: &str) -> ClientResult<Vec<PostDocument>> {
        match self.queries.search_posts(term).run().await {
            Some(result) => Ok(result?.documents),
            None => Ok(Vec::new()),
        }
    }

    // ===== Rendering =====

    /// Load-more indicator: feed mode with pages remaining
    pub fn show_load_more(&self) -> bool {
        self.mode() == DisplayMode::Feed && self.feed.has_next_page()
    }

    /// Screen state from cached data only, no fetching
    pub fn view(&self) -> ExploreView {
        match self.mode() {
            DisplayMode::Feed => match self.feed.data() {
                Some(data) => Self::feed_view(&data),
                None => ExploreView::Loading,
            },
            DisplayMode::Search(term) => {
                let state = self.queries.search_posts(&term).state();
                match state.data {
                    Some(page) if state.status != QueryStatus::Loading => {
                        ExploreView::SearchResults {
                            term,
                            posts: page.documents,
                        }
                    }
                    _ => ExploreView::Loading,
                }
            }
        }
    }

    fn feed_view(data: &InfiniteData<PostPage>) -> ExploreView {
        if data.pages.iter().all(|page| page.is_empty()) {
            return ExploreView::EndOfPosts;
        }
        let posts = data
            .pages
            .iter()
            .flat_map(|page| page.documents.iter().cloned())
            .collect();
        ExploreView::Feed {
            posts,
            has_next_page: data.has_next_page(),
        }
    }
}
