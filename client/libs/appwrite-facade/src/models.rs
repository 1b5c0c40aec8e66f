//! Snapgram documents and request inputs
//!
//! Field names follow the backend's JSON (`$id`, camelCase attributes).
//! Relationship attributes arrive either as a bare id or as the expanded
//! document, depending on query depth, hence [`Relation`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ===== Relationships =====

/// Reference to another document, collapsed or expanded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Relation<T> {
    Id(String),
    Document(Box<T>),
}

impl<T: HasId> Relation<T> {
    /// Id of the referenced document in either form
    pub fn id(&self) -> &str {
        match self {
            Relation::Id(id) => id.as_str(),
            Relation::Document(doc) => doc.id(),
        }
    }

    /// Expanded document, if the backend returned one
    pub fn document(&self) -> Option<&T> {
        match self {
            Relation::Id(_) => None,
            Relation::Document(doc) => Some(&**doc),
        }
    }
}

/// Documents addressable by their `$id`
pub trait HasId {
    fn id(&self) -> &str;
}

// ===== Documents =====

/// Row in the users collection, linked to an account by `accountId`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(rename = "$id")]
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub image_url: String,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    /// Posts this user liked (two-way relationship with `Post.likes`)
    #[serde(default)]
    pub liked: Vec<Relation<PostDocument>>,
    /// Saved-post records owned by this user
    #[serde(default)]
    pub save: Vec<Relation<SaveDocument>>,
}

impl HasId for UserDocument {
    fn id(&self) -> &str {
        &self.id
    }
}

impl UserDocument {
    /// Id of the saved-post record for `post_id`, if the user saved it
    pub fn saved_record_for(&self, post_id: &str) -> Option<&str> {
        self.save.iter().find_map(|record| {
            record
                .document()
                .filter(|save| save.post.id() == post_id)
                .map(|save| save.id.as_str())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDocument {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,
    pub creator: Relation<UserDocument>,
    pub caption: String,
    pub image_url: String,
    pub image_id: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub likes: Vec<Relation<UserDocument>>,
}

impl HasId for PostDocument {
    fn id(&self) -> &str {
        &self.id
    }
}

impl PostDocument {
    /// Ids of every user who liked the post
    pub fn liker_ids(&self) -> Vec<String> {
        self.likes.iter().map(|like| like.id().to_string()).collect()
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|like| like.id() == user_id)
    }
}

/// Saved-post record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDocument {
    #[serde(rename = "$id")]
    pub id: String,
    pub user: Relation<UserDocument>,
    pub post: Relation<PostDocument>,
}

impl HasId for SaveDocument {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Page of documents from a list call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentList<T> {
    pub total: u64,
    pub documents: Vec<T>,
}

impl<T> DocumentList<T> {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<T: HasId> DocumentList<T> {
    /// Cursor for the following page; `None` on an empty page
    pub fn last_id(&self) -> Option<String> {
        self.documents.last().map(|doc| doc.id().to_string())
    }
}

// ===== Account / storage =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(rename = "$id")]
    pub id: String,
    pub user_id: String,
    pub expire: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    #[serde(rename = "$id")]
    pub id: String,
    pub bucket_id: String,
    pub name: String,
    pub mime_type: String,
    pub size_original: u64,
}

// ===== Inputs =====

/// File bytes to upload
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a local image, guessing its type from the extension
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime_type = match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("svg") => "image/svg+xml",
            _ => "application/octet-stream",
        };
        Ok(Self::new(name, mime_type, bytes))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    /// Creator's user document id
    pub user_id: String,
    pub caption: String,
    pub file: FileUpload,
    pub location: Option<String>,
    /// Raw comma separated tag input
    pub tags: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePost {
    pub post_id: String,
    pub caption: String,
    /// Current image, kept when `file` is `None`
    pub image_id: String,
    pub image_url: String,
    pub file: Option<FileUpload>,
    pub location: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateUser {
    pub user_id: String,
    pub name: String,
    pub bio: Option<String>,
    /// Current image, kept when `file` is `None`
    pub image_id: Option<String>,
    pub image_url: String,
    pub file: Option<FileUpload>,
}

/// Split raw tag input: spaces removed, split on commas
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    raw.replace(' ', "")
        .split(',')
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
