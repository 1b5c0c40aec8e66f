//! Test Harness Module
//!
//! Provides infrastructure for end-to-end tests:
//! - Client configuration pointing at a wiremock Appwrite stand-in
//! - Recording navigator / notifier
//! - Canned Appwrite JSON documents

#![allow(dead_code)]

use config_core::{
    AppwriteConfig, ClientConfig, FeedConfig, HttpConfig, PreviewConfig, SearchConfig,
    SessionConfig,
};
use serde_json::{json, Value};
use snapgram_client::{Navigator, Notifier, Route, SnapgramApp};
use std::path::Path;
use std::sync::{Arc, Mutex};
use wiremock::MockServer;

pub const PROJECT: &str = "snapgram";
pub const POSTS: &str = "/v1/databases/main/collections/posts/documents";
pub const USERS: &str = "/v1/databases/main/collections/users/documents";

/// Configuration for a client talking to `server`
pub fn client_config(server: &MockServer, marker_path: &Path, debounce_ms: u64) -> ClientConfig {
    ClientConfig {
        appwrite: AppwriteConfig {
            endpoint: format!("{}/v1", server.uri()),
            project_id: PROJECT.to_string(),
            database_id: "main".to_string(),
            storage_id: "media".to_string(),
            user_collection_id: "users".to_string(),
            post_collection_id: "posts".to_string(),
            saves_collection_id: "saves".to_string(),
        },
        preview: PreviewConfig {
            width: 2000,
            height: 2000,
            gravity: "top".to_string(),
            quality: 100,
        },
        feed: FeedConfig {
            page_size: 10,
            recent_limit: 20,
        },
        search: SearchConfig { debounce_ms },
        http: HttpConfig {
            timeout_secs: 5,
            user_agent: "snapgram-e2e".to_string(),
        },
        session: SessionConfig {
            marker_path: marker_path.to_path_buf(),
        },
    }
}

/// Records navigation and notifications in order
#[derive(Default)]
pub struct Screen {
    pub routes: Mutex<Vec<Route>>,
    pub notices: Mutex<Vec<String>>,
}

impl Screen {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }
}

impl Navigator for Screen {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}

impl Notifier for Screen {
    fn notify(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }
}

pub fn app(config: ClientConfig) -> (SnapgramApp, Arc<Screen>) {
    let screen = Arc::new(Screen::default());
    let app = SnapgramApp::from_config(config, screen.clone(), screen.clone())
        .expect("client should build");
    (app, screen)
}

// ============================================
// Canned documents
// ============================================

pub fn post_json(id: &str) -> Value {
    json!({
        "$id": id,
        "$createdAt": "2024-03-01T10:00:00.000+00:00",
        "$updatedAt": "2024-03-01T10:00:00.000+00:00",
        "creator": {
            "$id": "u1",
            "accountId": "a1",
            "name": "Ada",
            "username": "ada",
            "email": "ada@example.com",
            "imageUrl": "https://img/ada"
        },
        "caption": format!("caption {}", id),
        "imageUrl": format!("https://img/{}", id),
        "imageId": format!("f-{}", id),
        "location": "Lisbon",
        "tags": ["sun"],
        "likes": []
    })
}

pub fn post_list(ids: std::ops::Range<usize>) -> Value {
    let documents: Vec<Value> = ids.map(|i| post_json(&format!("p{}", i))).collect();
    json!({ "total": documents.len(), "documents": documents })
}

pub fn account_json() -> Value {
    json!({ "$id": "a1", "name": "Ada", "email": "ada@example.com" })
}

pub fn user_list() -> Value {
    json!({
        "total": 1,
        "documents": [{
            "$id": "u1",
            "accountId": "a1",
            "name": "Ada",
            "username": "ada",
            "email": "ada@example.com",
            "imageUrl": "https://img/ada",
            "bio": "hi"
        }]
    })
}
