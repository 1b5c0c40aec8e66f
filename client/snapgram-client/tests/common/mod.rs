#![allow(dead_code)]

use appwrite_facade::{
    AccountInfo, DocumentList, FileUpload, NewPost, NewUser, PostDocument, Relation, SaveDocument,
    SessionInfo, SnapgramBackend, StoredFile, UpdatePost, UpdateUser, UserDocument,
};
use chrono::{TimeZone, Utc};
use error_types::ClientResult;
use mockall::mock;
use query_cache::QueryCache;
use snapgram_client::{Navigator, Notifier, Route, SessionContext, SnapgramQueries};
use std::sync::{Arc, Mutex};

// ============================================
// Mock Backend
// ============================================

mock! {
    pub Backend {}

    #[async_trait::async_trait]
    impl SnapgramBackend for Backend {
        async fn create_user_account(&self, user: NewUser) -> ClientResult<UserDocument>;
        async fn sign_in_account(&self, email: &str, password: &str) -> ClientResult<SessionInfo>;
        async fn get_account(&self) -> ClientResult<AccountInfo>;
        async fn get_current_user(&self) -> ClientResult<UserDocument>;
        async fn sign_out_account(&self) -> ClientResult<()>;
        async fn restore_session(&self) -> bool;
        async fn upload_file(&self, file: FileUpload) -> ClientResult<StoredFile>;
        fn get_file_preview(&self, file_id: &str) -> ClientResult<String>;
        async fn delete_file(&self, file_id: &str) -> ClientResult<()>;
        async fn create_post(&self, post: NewPost) -> ClientResult<PostDocument>;
        async fn get_recent_posts(&self) -> ClientResult<DocumentList<PostDocument>>;
        async fn like_post(&self, post_id: &str, likes: Vec<String>) -> ClientResult<PostDocument>;
        async fn save_post(&self, user_id: &str, post_id: &str) -> ClientResult<SaveDocument>;
        async fn delete_saved_post(&self, saved_record_id: &str) -> ClientResult<()>;
        async fn get_post_by_id(&self, post_id: &str) -> ClientResult<PostDocument>;
        async fn update_post(&self, post: UpdatePost) -> ClientResult<PostDocument>;
        async fn delete_post(&self, post_id: &str, image_id: &str) -> ClientResult<()>;
        async fn get_infinite_posts(&self, cursor: Option<String>) -> ClientResult<DocumentList<PostDocument>>;
        async fn search_posts(&self, term: &str) -> ClientResult<DocumentList<PostDocument>>;
        async fn get_users(&self, limit: Option<u32>) -> ClientResult<DocumentList<UserDocument>>;
        async fn get_user_by_id(&self, user_id: &str) -> ClientResult<UserDocument>;
        async fn update_user(&self, user: UpdateUser) -> ClientResult<UserDocument>;
    }
}

// ============================================
// Navigation / notification recorder
// ============================================

/// Records routes, notifications and backend calls in one ordered log
#[derive(Default)]
pub struct Recorder {
    pub events: Mutex<Vec<String>>,
    pub routes: Mutex<Vec<Route>>,
    pub notices: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn event(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }
}

impl Navigator for Recorder {
    fn navigate(&self, route: Route) {
        self.event(format!("navigate:{:?}", route));
        self.routes.lock().unwrap().push(route);
    }
}

impl Notifier for Recorder {
    fn notify(&self, message: &str) {
        self.event(format!("notify:{}", message));
        self.notices.lock().unwrap().push(message.to_string());
    }
}

// ============================================
// Wiring
// ============================================

pub fn queries_with(backend: MockBackend) -> Arc<SnapgramQueries> {
    Arc::new(SnapgramQueries::new(Arc::new(backend), QueryCache::new()))
}

pub fn session_with(backend: MockBackend) -> (SessionContext, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let session = SessionContext::new(
        queries_with(backend),
        recorder.clone(),
        recorder.clone(),
    );
    (session, recorder)
}

// ============================================
// Fixtures
// ============================================

pub fn user(id: &str) -> UserDocument {
    UserDocument {
        id: id.to_string(),
        account_id: format!("acc-{}", id),
        name: format!("User {}", id),
        username: id.to_string(),
        email: format!("{}@example.com", id),
        image_url: format!("https://img.example.com/{}", id),
        image_id: Some(format!("file-{}", id)),
        bio: None,
        liked: vec![],
        save: vec![],
    }
}

pub fn post(id: &str) -> PostDocument {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    PostDocument {
        id: id.to_string(),
        created_at: at,
        updated_at: at,
        creator: Relation::Id("u1".to_string()),
        caption: format!("caption {}", id),
        image_url: format!("https://img.example.com/{}", id),
        image_id: format!("file-{}", id),
        location: Some("Lisbon".to_string()),
        tags: vec!["sun".to_string()],
        likes: vec![],
    }
}

pub fn page(ids: &[String]) -> DocumentList<PostDocument> {
    DocumentList {
        total: ids.len() as u64,
        documents: ids.iter().map(|id| post(id)).collect(),
    }
}

pub fn post_ids(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("p{}", i)).collect()
}

pub fn session_info() -> SessionInfo {
    SessionInfo {
        id: "s1".to_string(),
        user_id: "acc-u1".to_string(),
        expire: "2030-01-01T00:00:00.000+00:00".to_string(),
    }
}
