//! Invalidation events broadcast to cache subscribers
//!
//! ```text
//! mutation succeeds (e.g. likePost)
//!   1. QueryCache::invalidate_many([getPostById:42, getRecentPosts, ...])
//!   2. matching entries marked stale (data kept)
//!   3. InvalidationEvent per key broadcast
//!      ↓
//! subscribers (screens holding those queries)
//!   4. refetch on next read
//! ```

use crate::QueryKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broadcast channel capacity; slow subscribers lag rather than block writers
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Why entries were invalidated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidationAction {
    /// Marked stale, data kept until refetched
    Stale,
    /// Dropped from the cache
    Remove,
    /// Entire cache cleared
    Clear,
}

/// One invalidation, as seen by subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    /// Prefix that was invalidated
    pub key: Option<QueryKey>,
    /// Number of cached entries it matched
    pub matched: usize,
    pub action: InvalidationAction,
    /// Mutation (or other caller) that triggered it
    pub source: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl InvalidationEvent {
    pub(crate) fn new(
        key: Option<QueryKey>,
        matched: usize,
        action: InvalidationAction,
        source: Option<&str>,
    ) -> Self {
        Self {
            key,
            matched,
            action,
            source: source.map(str::to_string),
            timestamp: Utc::now(),
        }
    }

    /// True when this event covers `key`
    pub fn affects(&self, key: &QueryKey) -> bool {
        match &self.key {
            Some(prefix) => prefix.is_prefix_of(key),
            None => true,
        }
    }
}
