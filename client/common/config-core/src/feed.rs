//! Feed pagination and search settings

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Paginated feed configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct FeedConfig {
    /// Posts per infinite-feed page
    #[validate(range(min = 1, max = 100))]
    pub page_size: u32,

    /// Posts in the recent-posts list
    #[validate(range(min = 1, max = 100))]
    pub recent_limit: u32,
}

/// Search input configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SearchConfig {
    /// Quiet period before a keystroke reaches the search call
    #[validate(range(min = 1, max = 10000))]
    pub debounce_ms: u64,
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
