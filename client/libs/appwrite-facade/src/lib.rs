//! Appwrite REST facade for the Snapgram client
//!
//! This library provides:
//! - [`AppwriteClient`]: one configured HTTP client per backend project,
//!   carrying the project header and the session fallback cookie
//! - Account, document, storage and avatar endpoints on that client
//! - [`SnapgramBackend`]: the domain operations (users, posts, saves, files),
//!   implemented by [`SnapgramApi`]
//! - [`SessionStore`]: persistence of the local session marker
//!
//! # Example
//!
//! ```ignore
//! use appwrite_facade::{FileSessionStore, SnapgramApi, SnapgramBackend};
//!
//! let config = config_core::ClientConfig::load(None)?;
//! let store = Arc::new(FileSessionStore::new(&config.session.marker_path));
//! let api = SnapgramApi::from_config(&config, store)?;
//! let feed = api.get_infinite_posts(None).await?;
//! ```

pub mod account;
pub mod client;
pub mod databases;
pub mod facade;
pub mod models;
pub mod session_store;
pub mod storage;

pub use client::AppwriteClient;
pub use databases::DocumentQuery;
pub use facade::{SnapgramApi, SnapgramBackend};
pub use models::{
    parse_tags, AccountInfo, DocumentList, FileUpload, HasId, NewPost, NewUser, PostDocument,
    Relation, SaveDocument, SessionInfo, StoredFile, UpdatePost, UpdateUser, UserDocument,
};
pub use session_store::{
    marker_indicates_session, FileSessionStore, MemorySessionStore, SessionStore,
};
