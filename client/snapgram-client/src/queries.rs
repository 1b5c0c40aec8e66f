//! Data-access hooks
//!
//! Every backend operation wrapped as a cached query or an invalidating
//! mutation. Reads share the [`QueryCache`]; each mutation marks a fixed set
//! of keys stale once the write succeeds.

use appwrite_facade::{
    DocumentList, NewPost, NewUser, PostDocument, SaveDocument, SessionInfo, SnapgramBackend,
    UpdatePost, UpdateUser, UserDocument,
};
use error_types::{ClientError, ClientResult};
use futures::FutureExt;
use query_cache::{InfiniteQuery, Mutation, Query, QueryCache};
use std::sync::Arc;
use tracing::info;

pub type PostPage = DocumentList<PostDocument>;

// ===== Query keys =====

pub mod keys {
    use query_cache::QueryKey;

    pub const GET_CURRENT_USER: &str = "getCurrentUser";
    pub const GET_USERS: &str = "getUsers";
    pub const GET_USER_BY_ID: &str = "getUserById";
    pub const GET_POST_BY_ID: &str = "getPostById";
    pub const GET_RECENT_POSTS: &str = "getRecentPosts";
    pub const GET_INFINITE_POSTS: &str = "getInfinitePosts";
    pub const SEARCH_POSTS: &str = "searchPosts";

    pub fn current_user() -> QueryKey {
        QueryKey::new(GET_CURRENT_USER)
    }

    /// Every users-list variant, whatever its limit
    pub fn users() -> QueryKey {
        QueryKey::new(GET_USERS)
    }

    pub fn users_limited(limit: Option<u32>) -> QueryKey {
        match limit {
            Some(limit) => users().with(limit.to_string()),
            None => users().with("all"),
        }
    }

    pub fn user_by_id(user_id: &str) -> QueryKey {
        QueryKey::new(GET_USER_BY_ID).with(user_id)
    }

    pub fn post_by_id(post_id: &str) -> QueryKey {
        QueryKey::new(GET_POST_BY_ID).with(post_id)
    }

    pub fn recent_posts() -> QueryKey {
        QueryKey::new(GET_RECENT_POSTS)
    }

    pub fn infinite_posts() -> QueryKey {
        QueryKey::new(GET_INFINITE_POSTS)
    }

    /// Every cached search, whatever its term
    pub fn searches() -> QueryKey {
        QueryKey::new(SEARCH_POSTS)
    }

    pub fn search_posts(term: &str) -> QueryKey {
        searches().with(term)
    }
}

// ===== Invalidation sets =====

/// Keys each successful mutation marks stale
pub mod invalidation {
    use super::keys;
    use query_cache::QueryKey;

    pub fn create_post() -> Vec<QueryKey> {
        vec![keys::recent_posts(), keys::infinite_posts(), keys::searches()]
    }

    /// The liker list is mirrored on the user's `liked` relationship, so
    /// the current user is refetched too
    pub fn like_post(post_id: &str) -> Vec<QueryKey> {
        vec![
            keys::post_by_id(post_id),
            keys::recent_posts(),
            keys::infinite_posts(),
            keys::current_user(),
        ]
    }

    pub fn save_post() -> Vec<QueryKey> {
        vec![
            keys::recent_posts(),
            keys::infinite_posts(),
            keys::current_user(),
        ]
    }

    pub fn delete_saved_post() -> Vec<QueryKey> {
        save_post()
    }

    pub fn update_post(post_id: &str) -> Vec<QueryKey> {
        vec![
            keys::post_by_id(post_id),
            keys::recent_posts(),
            keys::infinite_posts(),
            keys::searches(),
        ]
    }

    pub fn delete_post(post_id: &str) -> Vec<QueryKey> {
        update_post(post_id)
    }

    pub fn update_user(user_id: &str) -> Vec<QueryKey> {
        vec![
            keys::current_user(),
            keys::user_by_id(user_id),
            keys::users(),
        ]
    }

    pub fn sign_in() -> Vec<QueryKey> {
        vec![keys::current_user()]
    }
}

/// Mutation handles, one per write, exposing pending/error state
#[derive(Clone)]
pub struct Mutations {
    pub create_user_account: Mutation,
    pub sign_in_account: Mutation,
    pub create_post: Mutation,
    pub like_post: Mutation,
    pub save_post: Mutation,
    pub delete_saved_post: Mutation,
    pub update_post: Mutation,
    pub delete_post: Mutation,
    pub update_user: Mutation,
}

impl Mutations {
    fn new(cache: &QueryCache) -> Self {
        Self {
            create_user_account: Mutation::new(cache, "createUserAccount"),
            sign_in_account: Mutation::new(cache, "signInAccount"),
            create_post: Mutation::new(cache, "createPost"),
            like_post: Mutation::new(cache, "likePost"),
            save_post: Mutation::new(cache, "savePost"),
            delete_saved_post: Mutation::new(cache, "deleteSavedPost"),
            update_post: Mutation::new(cache, "updatePost"),
            delete_post: Mutation::new(cache, "deletePost"),
            update_user: Mutation::new(cache, "updateUser"),
        }
    }
}

/// Hooks bound to one backend and one cache
pub struct SnapgramQueries {
    backend: Arc<dyn SnapgramBackend>,
    cache: QueryCache,
    mutations: Mutations,
}

impl SnapgramQueries {
    pub fn new(backend: Arc<dyn SnapgramBackend>, cache: QueryCache) -> Self {
        let mutations = Mutations::new(&cache);
        Self {
            backend,
            cache,
            mutations,
        }
    }

    pub fn backend(&self) -> &Arc<dyn SnapgramBackend> {
        &self.backend
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn mutations(&self) -> &Mutations {
        &self.mutations
    }

    // ===== Queries =====

    pub fn current_user(&self) -> Query<UserDocument, ClientError> {
        let backend = Arc::clone(&self.backend);
        Query::new(&self.cache, keys::current_user(), move || {
            let backend = Arc::clone(&backend);
            async move { backend.get_current_user().await }.boxed()
        })
    }

    pub fn recent_posts(&self) -> Query<PostPage, ClientError> {
        let backend = Arc::clone(&self.backend);
        Query::new(&self.cache, keys::recent_posts(), move || {
            let backend = Arc::clone(&backend);
            async move { backend.get_recent_posts().await }.boxed()
        })
    }

    /// Disabled for an empty id
    pub fn post_by_id(&self, post_id: &str) -> Query<PostDocument, ClientError> {
        let backend = Arc::clone(&self.backend);
        let id = post_id.to_string();
        Query::new(&self.cache, keys::post_by_id(post_id), move || {
            let backend = Arc::clone(&backend);
            let id = id.clone();
            async move { backend.get_post_by_id(&id).await }.boxed()
        })
        .enabled(!post_id.is_empty())
    }

    /// Feed pages ordered by last update; the last id of a page is the next
    /// cursor and an empty page ends the feed
    pub fn infinite_posts(&self) -> InfiniteQuery<PostPage, ClientError> {
        let backend = Arc::clone(&self.backend);
        InfiniteQuery::new(
            &self.cache,
            keys::infinite_posts(),
            move |cursor: Option<String>| {
                let backend = Arc::clone(&backend);
                async move { backend.get_infinite_posts(cursor).await }.boxed()
            },
            |page: &PostPage| page.last_id(),
        )
    }

    /// Disabled for an empty term
    pub fn search_posts(&self, term: &str) -> Query<PostPage, ClientError> {
        let backend = Arc::clone(&self.backend);
        let term_owned = term.to_string();
        Query::new(&self.cache, keys::search_posts(term), move || {
            let backend = Arc::clone(&backend);
            let term = term_owned.clone();
            async move { backend.search_posts(&term).await }.boxed()
        })
        .enabled(!term.is_empty())
    }

    pub fn users(&self, limit: Option<u32>) -> Query<DocumentList<UserDocument>, ClientError> {
        let backend = Arc::clone(&self.backend);
        Query::new(&self.cache, keys::users_limited(limit), move || {
            let backend = Arc::clone(&backend);
            async move { backend.get_users(limit).await }.boxed()
        })
    }

    /// Disabled for an empty id
    pub fn user_by_id(&self, user_id: &str) -> Query<UserDocument, ClientError> {
        let backend = Arc::clone(&self.backend);
        let id = user_id.to_string();
        Query::new(&self.cache, keys::user_by_id(user_id), move || {
            let backend = Arc::clone(&backend);
            let id = id.clone();
            async move { backend.get_user_by_id(&id).await }.boxed()
        })
        .enabled(!user_id.is_empty())
    }

    // ===== Mutations =====

    pub async fn create_user_account(&self, user: NewUser) -> ClientResult<UserDocument> {
        self.mutations
            .create_user_account
            .mutate(self.backend.create_user_account(user), |_| Vec::new())
            .await
    }

    pub async fn sign_in_account(&self, email: &str, password: &str) -> ClientResult<SessionInfo> {
        self.mutations
            .sign_in_account
            .mutate(self.backend.sign_in_account(email, password), |_| {
                invalidation::sign_in()
            })
            .await
    }

    /// Delete the remote session and drop every cached read
    pub async fn sign_out_account(&self) -> ClientResult<()> {
        self.backend.sign_out_account().await?;
        self.cache.clear();
        info!("Signed out, query cache cleared");
        Ok(())
    }

    pub async fn create_post(&self, post: NewPost) -> ClientResult<PostDocument> {
        self.mutations
            .create_post
            .mutate(self.backend.create_post(post), |_| invalidation::create_post())
            .await
    }

    pub async fn like_post(&self, post_id: &str, likes: Vec<String>) -> ClientResult<PostDocument> {
        self.mutations
            .like_post
            .mutate(self.backend.like_post(post_id, likes), |post: &PostDocument| {
                invalidation::like_post(&post.id)
            })
            .await
    }

    pub async fn save_post(&self, user_id: &str, post_id: &str) -> ClientResult<SaveDocument> {
        self.mutations
            .save_post
            .mutate(self.backend.save_post(user_id, post_id), |_| {
                invalidation::save_post()
            })
            .await
    }

    pub async fn delete_saved_post(&self, saved_record_id: &str) -> ClientResult<()> {
        self.mutations
            .delete_saved_post
            .mutate(self.backend.delete_saved_post(saved_record_id), |_| {
                invalidation::delete_saved_post()
            })
            .await
    }

    pub async fn update_post(&self, post: UpdatePost) -> ClientResult<PostDocument> {
        self.mutations
            .update_post
            .mutate(self.backend.update_post(post), |post: &PostDocument| {
                invalidation::update_post(&post.id)
            })
            .await
    }

    pub async fn delete_post(&self, post_id: &str, image_id: &str) -> ClientResult<()> {
        self.mutations
            .delete_post
            .mutate(self.backend.delete_post(post_id, image_id), |_| {
                invalidation::delete_post(post_id)
            })
            .await
    }

    pub async fn update_user(&self, user: UpdateUser) -> ClientResult<UserDocument> {
        self.mutations
            .update_user
            .mutate(self.backend.update_user(user), |user: &UserDocument| {
                invalidation::update_user(&user.id)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_cache::QueryKey;

    #[test]
    fn test_like_invalidates_exactly_four_keys() {
        let keys = invalidation::like_post("p1");
        assert_eq!(
            keys,
            vec![
                QueryKey::new("getPostById").with("p1"),
                QueryKey::new("getRecentPosts"),
                QueryKey::new("getInfinitePosts"),
                QueryKey::new("getCurrentUser"),
            ]
        );
    }

    #[test]
    fn test_users_prefix_covers_every_limit() {
        assert!(keys::users().is_prefix_of(&keys::users_limited(Some(10))));
        assert!(keys::users().is_prefix_of(&keys::users_limited(None)));
    }

    #[test]
    fn test_post_content_mutations_reach_every_search() {
        for set in [
            invalidation::create_post(),
            invalidation::update_post("p1"),
            invalidation::delete_post("p1"),
        ] {
            assert!(set.contains(&keys::searches()));
            assert!(keys::searches().is_prefix_of(&keys::search_posts("sun")));
        }
        assert!(!invalidation::like_post("p1").contains(&keys::searches()));
    }

    #[test]
    fn test_post_mutations_leave_users_alone() {
        for set in [
            invalidation::create_post(),
            invalidation::update_post("p1"),
            invalidation::delete_post("p1"),
        ] {
            assert!(!set.contains(&keys::users()));
            assert!(!set.contains(&keys::current_user()));
        }
    }
}
