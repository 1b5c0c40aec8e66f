//! Keyed query cache for the Snapgram client
//!
//! **Architecture**:
//! ```text
//! Query / InfiniteQuery ──read──▶ QueryCache (DashMap) ◀──invalidate── Mutation
//!                                     │
//!                                     └── broadcast InvalidationEvent ──▶ subscribers
//! ```
//!
//! **Semantics**:
//! - Reads of one key share a single in-flight fetch
//! - Entries stay fresh until a mutation invalidates them (or a stale time elapses)
//! - Stale data remains readable while the refetch runs
//! - Infinite queries refetch every loaded page from the first cursor
//!
//! **Usage**:
//! ```ignore
//! let cache = QueryCache::new();
//! let posts = Query::new(&cache, QueryKey::new("getRecentPosts"), move || {
//!     let api = api.clone();
//!     async move { api.get_recent_posts().await }.boxed()
//! });
//! let state = posts.fetch().await;
//! ```

pub mod cache;
pub mod infinite;
pub mod invalidation;
pub mod key;
pub mod mutation;
pub mod query;
pub mod state;
mod stats;

pub use cache::{CachePolicy, QueryCache};
pub use infinite::{InfiniteData, InfiniteQuery};
pub use invalidation::{InvalidationAction, InvalidationEvent};
pub use key::QueryKey;
pub use mutation::{Mutation, MutationState, MutationStatus};
pub use query::Query;
pub use state::{QueryState, QueryStatus};
pub use stats::CacheStats;
