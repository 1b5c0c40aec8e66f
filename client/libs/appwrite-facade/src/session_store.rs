//! Local session marker persistence
//!
//! The backend answers session creation with a fallback-cookie header; the
//! client keeps that value between runs and sends it back on every request.
//! An absent, empty or `[]` value means there is no session.

use async_trait::async_trait;
use error_types::ClientResult;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// Value the backend SDKs store when no session cookie exists
pub const EMPTY_MARKER: &str = "[]";

/// True when a stored marker denotes an active session
pub fn marker_indicates_session(marker: Option<&str>) -> bool {
    match marker.map(str::trim) {
        None | Some("") | Some(EMPTY_MARKER) => false,
        Some(_) => true,
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> ClientResult<Option<String>>;

    async fn save(&self, marker: &str) -> ClientResult<()>;

    async fn clear(&self) -> ClientResult<()>;

    /// Whether a usable marker is present; read failures count as absent
    async fn has_session(&self) -> bool {
        match self.load().await {
            Ok(marker) => marker_indicates_session(marker.as_deref()),
            Err(e) => {
                e.log();
                false
            }
        }
    }
}

/// Marker kept in a file on disk
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> ClientResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, marker: &str) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, marker).await?;
        debug!(path = %self.path.display(), "Session marker saved");
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session marker cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Marker kept in memory, for tests and ephemeral runs
#[derive(Default)]
pub struct MemorySessionStore {
    marker: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: RwLock::new(Some(marker.into())),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> ClientResult<Option<String>> {
        Ok(self.marker.read().await.clone())
    }

    async fn save(&self, marker: &str) -> ClientResult<()> {
        *self.marker.write().await = Some(marker.to_string());
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        *self.marker.write().await = None;
        Ok(())
    }
}
