//! Snapgram domain operations over the backend
//!
//! **Image consistency**:
//! - A file uploaded for a document write is deleted again if the write fails
//! - A replaced image is deleted only after the new write succeeded
//! - Compensating deletes are best effort: failures are logged, not returned

use crate::client::AppwriteClient;
use crate::databases::DocumentQuery;
use crate::models::{
    parse_tags, AccountInfo, DocumentList, FileUpload, NewPost, NewUser, PostDocument,
    SaveDocument, SessionInfo, StoredFile, UpdatePost, UpdateUser, UserDocument,
};
use crate::session_store::SessionStore;
use async_trait::async_trait;
use config_core::{ClientConfig, FeedConfig};
use error_types::{ClientError, ClientResult, ValidationError};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Every backend operation the client performs
#[async_trait]
pub trait SnapgramBackend: Send + Sync {
    // ===== Auth =====

    /// Create the account, then its user document with an initials avatar
    async fn create_user_account(&self, user: NewUser) -> ClientResult<UserDocument>;

    async fn sign_in_account(&self, email: &str, password: &str) -> ClientResult<SessionInfo>;

    async fn get_account(&self) -> ClientResult<AccountInfo>;

    /// User document whose `accountId` matches the session's account
    async fn get_current_user(&self) -> ClientResult<UserDocument>;

    async fn sign_out_account(&self) -> ClientResult<()>;

    /// Load the local session marker; true when it denotes a session
    async fn restore_session(&self) -> bool;

    // ===== Files =====

    async fn upload_file(&self, file: FileUpload) -> ClientResult<StoredFile>;

    fn get_file_preview(&self, file_id: &str) -> ClientResult<String>;

    async fn delete_file(&self, file_id: &str) -> ClientResult<()>;

    // ===== Posts =====

    async fn create_post(&self, post: NewPost) -> ClientResult<PostDocument>;

    async fn get_recent_posts(&self) -> ClientResult<DocumentList<PostDocument>>;

    /// Replace the post's liker list
    async fn like_post(&self, post_id: &str, likes: Vec<String>) -> ClientResult<PostDocument>;

    async fn save_post(&self, user_id: &str, post_id: &str) -> ClientResult<SaveDocument>;

    async fn delete_saved_post(&self, saved_record_id: &str) -> ClientResult<()>;

    async fn get_post_by_id(&self, post_id: &str) -> ClientResult<PostDocument>;

    async fn update_post(&self, post: UpdatePost) -> ClientResult<PostDocument>;

    /// Delete the post, then its image
    async fn delete_post(&self, post_id: &str, image_id: &str) -> ClientResult<()>;

    /// One feed page after `cursor`, newest update first
    async fn get_infinite_posts(
        &self,
        cursor: Option<String>,
    ) -> ClientResult<DocumentList<PostDocument>>;

    async fn search_posts(&self, term: &str) -> ClientResult<DocumentList<PostDocument>>;

    // ===== Users =====

    async fn get_users(&self, limit: Option<u32>) -> ClientResult<DocumentList<UserDocument>>;

    async fn get_user_by_id(&self, user_id: &str) -> ClientResult<UserDocument>;

    async fn update_user(&self, user: UpdateUser) -> ClientResult<UserDocument>;
}

// ===== Document bodies =====

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord<'a> {
    account_id: &'a str,
    name: &'a str,
    email: &'a str,
    username: &'a str,
    image_url: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    creator: Option<&'a str>,
    caption: &'a str,
    image_url: &'a str,
    image_id: &'a str,
    location: Option<&'a str>,
    tags: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileRecord<'a> {
    name: &'a str,
    bio: Option<&'a str>,
    image_url: &'a str,
    image_id: Option<&'a str>,
}

#[derive(Serialize)]
struct LikesRecord<'a> {
    likes: &'a [String],
}

#[derive(Serialize)]
struct SaveRecord<'a> {
    user: &'a str,
    post: &'a str,
}

/// Newly uploaded image awaiting its document write
struct PendingImage {
    id: String,
    url: String,
}

fn require(field: &'static str, value: &str) -> ClientResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(format!("{} is required", field))
            .add_field_error(field, "required", format!("{} must not be empty", field))
            .into());
    }
    Ok(())
}

/// Log a failed call at the facade boundary and pass it through
fn logged<T>(operation: &'static str, result: ClientResult<T>) -> ClientResult<T> {
    if let Err(e) = &result {
        match e {
            ClientError::Unauthenticated | ClientError::Validation { .. } => {
                debug!(operation, error = %e, "Snapgram call rejected");
            }
            _ => warn!(operation, error = %e, "Snapgram call failed"),
        }
    }
    result
}

/// Backend facade bound to one project's collections
pub struct SnapgramApi {
    client: Arc<AppwriteClient>,
    feed: FeedConfig,
}

impl SnapgramApi {
    pub fn new(client: Arc<AppwriteClient>, feed: FeedConfig) -> Self {
        Self { client, feed }
    }

    /// Build the client and facade from loaded configuration
    pub fn from_config(config: &ClientConfig, session: Arc<dyn SessionStore>) -> ClientResult<Self> {
        let client = AppwriteClient::new(
            config.appwrite.clone(),
            &config.http,
            config.preview.clone(),
            session,
        )?;
        Ok(Self::new(Arc::new(client), config.feed.clone()))
    }

    pub fn client(&self) -> &AppwriteClient {
        &self.client
    }

    fn users(&self) -> &str {
        &self.client.config().user_collection_id
    }

    fn posts(&self) -> &str {
        &self.client.config().post_collection_id
    }

    fn saves(&self) -> &str {
        &self.client.config().saves_collection_id
    }

    /// Best-effort delete of an orphaned or replaced image
    async fn discard_file(&self, file_id: &str) {
        if let Err(e) = self.client.delete_stored_file(file_id).await {
            warn!(file_id, error = %e, "Failed to delete stored file, it may be orphaned");
        }
    }

    /// Upload and resolve the preview URL, removing the upload if that fails
    async fn upload_image(&self, file: FileUpload) -> ClientResult<PendingImage> {
        let stored = self.client.create_file(file).await?;
        match self.client.file_preview_url(&stored.id) {
            Ok(url) => Ok(PendingImage {
                id: stored.id,
                url: url.to_string(),
            }),
            Err(e) => {
                self.discard_file(&stored.id).await;
                Err(e)
            }
        }
    }

    async fn save_user_to_db(&self, account: &AccountInfo, user: &NewUser) -> ClientResult<UserDocument> {
        let avatar = self.client.initials_avatar_url(&account.name)?;
        let record = UserRecord {
            account_id: &account.id,
            name: &account.name,
            email: &account.email,
            username: &user.username,
            image_url: avatar.as_str(),
        };
        self.client.create_document(self.users(), &record).await
    }

    async fn create_user_account_inner(&self, user: NewUser) -> ClientResult<UserDocument> {
        let account = self
            .client
            .create_account(&user.email, &user.password, &user.name)
            .await?;
        let document = self.save_user_to_db(&account, &user).await?;
        info!(user_id = %document.id, account_id = %account.id, "User registered");
        Ok(document)
    }

    async fn get_current_user_inner(&self) -> ClientResult<UserDocument> {
        let account = self.client.get_account().await?;
        let users: DocumentList<UserDocument> = self
            .client
            .list_documents(
                self.users(),
                &[DocumentQuery::equal("accountId", account.id.clone())],
            )
            .await?;
        users
            .documents
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::not_found("users", account.id))
    }

    async fn create_post_inner(&self, post: NewPost) -> ClientResult<PostDocument> {
        require("user_id", &post.user_id)?;
        let image = self.upload_image(post.file).await?;
        let record = PostRecord {
            creator: Some(&post.user_id),
            caption: &post.caption,
            image_url: &image.url,
            image_id: &image.id,
            location: post.location.as_deref(),
            tags: parse_tags(post.tags.as_deref()),
        };

        match self.client.create_document(self.posts(), &record).await {
            Ok(document) => Ok(document),
            Err(e) => {
                self.discard_file(&image.id).await;
                Err(e)
            }
        }
    }

    async fn update_post_inner(&self, post: UpdatePost) -> ClientResult<PostDocument> {
        require("post_id", &post.post_id)?;
        let replacement = match post.file {
            Some(file) => Some(self.upload_image(file).await?),
            None => None,
        };
        let (image_id, image_url) = match &replacement {
            Some(image) => (image.id.as_str(), image.url.as_str()),
            None => (post.image_id.as_str(), post.image_url.as_str()),
        };
        let record = PostRecord {
            creator: None,
            caption: &post.caption,
            image_url,
            image_id,
            location: post.location.as_deref(),
            tags: parse_tags(post.tags.as_deref()),
        };

        let result = self
            .client
            .update_document(self.posts(), &post.post_id, &record)
            .await;
        match (result, replacement) {
            (Ok(document), Some(image)) => {
                if !post.image_id.is_empty() && post.image_id != image.id {
                    self.discard_file(&post.image_id).await;
                }
                Ok(document)
            }
            (Ok(document), None) => Ok(document),
            (Err(e), Some(image)) => {
                self.discard_file(&image.id).await;
                Err(e)
            }
            (Err(e), None) => Err(e),
        }
    }

    async fn delete_post_inner(&self, post_id: &str, image_id: &str) -> ClientResult<()> {
        require("post_id", post_id)?;
        self.client.delete_document(self.posts(), post_id).await?;
        if !image_id.is_empty() {
            self.discard_file(image_id).await;
        }
        info!(post_id, "Post deleted");
        Ok(())
    }

    async fn update_user_inner(&self, user: UpdateUser) -> ClientResult<UserDocument> {
        require("user_id", &user.user_id)?;
        let replacement = match user.file {
            Some(file) => Some(self.upload_image(file).await?),
            None => None,
        };
        let (image_id, image_url) = match &replacement {
            Some(image) => (Some(image.id.as_str()), image.url.as_str()),
            None => (user.image_id.as_deref(), user.image_url.as_str()),
        };
        let record = ProfileRecord {
            name: &user.name,
            bio: user.bio.as_deref(),
            image_url,
            image_id,
        };

        let result = self
            .client
            .update_document(self.users(), &user.user_id, &record)
            .await;
        match (result, replacement) {
            (Ok(document), Some(image)) => {
                if let Some(old) = user.image_id.as_deref() {
                    if !old.is_empty() && old != image.id {
                        self.discard_file(old).await;
                    }
                }
                Ok(document)
            }
            (Ok(document), None) => Ok(document),
            (Err(e), Some(image)) => {
                self.discard_file(&image.id).await;
                Err(e)
            }
            (Err(e), None) => Err(e),
        }
    }
}

#[async_trait]
impl SnapgramBackend for SnapgramApi {
    async fn create_user_account(&self, user: NewUser) -> ClientResult<UserDocument> {
        logged("create_user_account", self.create_user_account_inner(user).await)
    }

    async fn sign_in_account(&self, email: &str, password: &str) -> ClientResult<SessionInfo> {
        logged(
            "sign_in_account",
            self.client.create_email_session(email, password).await,
        )
    }

    async fn get_account(&self) -> ClientResult<AccountInfo> {
        logged("get_account", self.client.get_account().await)
    }

    async fn get_current_user(&self) -> ClientResult<UserDocument> {
        logged("get_current_user", self.get_current_user_inner().await)
    }

    async fn sign_out_account(&self) -> ClientResult<()> {
        logged("sign_out_account", self.client.delete_current_session().await)
    }

    async fn restore_session(&self) -> bool {
        match self.client.restore_session().await {
            Ok(active) => active,
            Err(e) => {
                e.log();
                false
            }
        }
    }

    async fn upload_file(&self, file: FileUpload) -> ClientResult<StoredFile> {
        logged("upload_file", self.client.create_file(file).await)
    }

    fn get_file_preview(&self, file_id: &str) -> ClientResult<String> {
        logged(
            "get_file_preview",
            self.client.file_preview_url(file_id).map(|url| url.to_string()),
        )
    }

    async fn delete_file(&self, file_id: &str) -> ClientResult<()> {
        logged("delete_file", self.client.delete_stored_file(file_id).await)
    }

    async fn create_post(&self, post: NewPost) -> ClientResult<PostDocument> {
        logged("create_post", self.create_post_inner(post).await)
    }

    async fn get_recent_posts(&self) -> ClientResult<DocumentList<PostDocument>> {
        let queries = [
            DocumentQuery::order_desc("$createdAt"),
            DocumentQuery::limit(self.feed.recent_limit),
        ];
        logged(
            "get_recent_posts",
            self.client.list_documents(self.posts(), &queries).await,
        )
    }

    async fn like_post(&self, post_id: &str, likes: Vec<String>) -> ClientResult<PostDocument> {
        let result = match require("post_id", post_id) {
            Ok(()) => {
                self.client
                    .update_document(self.posts(), post_id, &LikesRecord { likes: &likes })
                    .await
            }
            Err(e) => Err(e),
        };
        logged("like_post", result)
    }

    async fn save_post(&self, user_id: &str, post_id: &str) -> ClientResult<SaveDocument> {
        let record = SaveRecord {
            user: user_id,
            post: post_id,
        };
        logged(
            "save_post",
            self.client.create_document(self.saves(), &record).await,
        )
    }

    async fn delete_saved_post(&self, saved_record_id: &str) -> ClientResult<()> {
        let result = match require("saved_record_id", saved_record_id) {
            Ok(()) => {
                self.client
                    .delete_document(self.saves(), saved_record_id)
                    .await
            }
            Err(e) => Err(e),
        };
        logged("delete_saved_post", result)
    }

    async fn get_post_by_id(&self, post_id: &str) -> ClientResult<PostDocument> {
        let result = match require("post_id", post_id) {
            Ok(()) => self.client.get_document(self.posts(), post_id).await,
            Err(e) => Err(e),
        };
        logged("get_post_by_id", result)
    }

    async fn update_post(&self, post: UpdatePost) -> ClientResult<PostDocument> {
        logged("update_post", self.update_post_inner(post).await)
    }

    async fn delete_post(&self, post_id: &str, image_id: &str) -> ClientResult<()> {
        logged("delete_post", self.delete_post_inner(post_id, image_id).await)
    }

    async fn get_infinite_posts(
        &self,
        cursor: Option<String>,
    ) -> ClientResult<DocumentList<PostDocument>> {
        let mut queries = vec![
            DocumentQuery::order_desc("$updatedAt"),
            DocumentQuery::limit(self.feed.page_size),
        ];
        if let Some(cursor) = cursor {
            queries.push(DocumentQuery::cursor_after(cursor));
        }
        logged(
            "get_infinite_posts",
            self.client.list_documents(self.posts(), &queries).await,
        )
    }

    async fn search_posts(&self, term: &str) -> ClientResult<DocumentList<PostDocument>> {
        let queries = [DocumentQuery::search("caption", term)];
        logged(
            "search_posts",
            self.client.list_documents(self.posts(), &queries).await,
        )
    }

    async fn get_users(&self, limit: Option<u32>) -> ClientResult<DocumentList<UserDocument>> {
        let mut queries = vec![DocumentQuery::order_desc("$createdAt")];
        if let Some(limit) = limit {
            queries.push(DocumentQuery::limit(limit));
        }
        logged(
            "get_users",
            self.client.list_documents(self.users(), &queries).await,
        )
    }

    async fn get_user_by_id(&self, user_id: &str) -> ClientResult<UserDocument> {
        let result = match require("user_id", user_id) {
            Ok(()) => self.client.get_document(self.users(), user_id).await,
            Err(e) => Err(e),
        };
        logged("get_user_by_id", result)
    }

    async fn update_user(&self, user: UpdateUser) -> ClientResult<UserDocument> {
        logged("update_user", self.update_user_inner(user).await)
    }
}
