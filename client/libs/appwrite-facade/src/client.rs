//! REST transport shared by the account, database, storage and avatar APIs

use crate::session_store::{marker_indicates_session, SessionStore};
use config_core::{AppwriteConfig, HttpConfig, PreviewConfig};
use error_types::{ClientError, ClientResult};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

pub const PROJECT_HEADER: &str = "X-Appwrite-Project";
pub const FALLBACK_COOKIE_HEADER: &str = "X-Fallback-Cookies";
pub const RESPONSE_FORMAT_HEADER: &str = "X-Appwrite-Response-Format";

/// API version the models in this crate follow
pub const RESPONSE_FORMAT: &str = "1.4.0";

/// Id placeholder asking the backend to generate one
pub const UNIQUE_ID: &str = "unique()";

/// Error body returned on non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// Client for one backend project
///
/// Built once at startup and shared behind an `Arc`. Holds the fallback
/// cookie in memory and mirrors it to the [`SessionStore`].
pub struct AppwriteClient {
    http: Client,
    config: AppwriteConfig,
    preview: PreviewConfig,
    session: Arc<dyn SessionStore>,
    fallback_cookie: RwLock<Option<String>>,
}

impl AppwriteClient {
    pub fn new(
        config: AppwriteConfig,
        http_config: &HttpConfig,
        preview: PreviewConfig,
        session: Arc<dyn SessionStore>,
    ) -> ClientResult<Self> {
        // Rejects malformed endpoints before the first request
        config.endpoint_url()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            PROJECT_HEADER,
            HeaderValue::from_str(&config.project_id).map_err(|e| {
                ClientError::configuration(format!("Invalid project id: {}", e))
            })?,
        );
        headers.insert(
            RESPONSE_FORMAT_HEADER,
            HeaderValue::from_static(RESPONSE_FORMAT),
        );

        let http = Client::builder()
            .timeout(http_config.timeout())
            .user_agent(http_config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ClientError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            config,
            preview,
            session,
            fallback_cookie: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &AppwriteConfig {
        &self.config
    }

    pub fn preview_config(&self) -> &PreviewConfig {
        &self.preview
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Load the persisted marker into memory; true when it denotes a session
    pub async fn restore_session(&self) -> ClientResult<bool> {
        let marker = self.session.load().await?;
        let active = marker_indicates_session(marker.as_deref());
        *self.fallback_cookie.write().await = marker.filter(|_| active);
        debug!(active, "Session marker restored");
        Ok(active)
    }

    /// Forget the session locally and on disk
    pub async fn forget_session(&self) -> ClientResult<()> {
        *self.fallback_cookie.write().await = None;
        self.session.clear().await
    }

    pub(crate) fn url(&self, path: &str) -> String {
        self.config.api_url(path)
    }

    // ===== Request helpers =====

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        service: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let request = self.http.get(self.url(path)).query(query);
        let response = self.execute(service, request).await?;
        Self::decode(service, response).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        service: &'static str,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let request = self.http.post(self.url(path)).json(body);
        let response = self.execute(service, request).await?;
        Self::decode(service, response).await
    }

    pub(crate) async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        service: &'static str,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let request = self.http.patch(self.url(path)).json(body);
        let response = self.execute(service, request).await?;
        Self::decode(service, response).await
    }

    pub(crate) async fn delete(&self, service: &'static str, path: &str) -> ClientResult<()> {
        let request = self.http.delete(self.url(path));
        self.execute(service, request).await?;
        Ok(())
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        service: &'static str,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ClientResult<T> {
        let request = self.http.post(self.url(path)).multipart(form);
        let response = self.execute(service, request).await?;
        Self::decode(service, response).await
    }

    /// Send with the session header, capture a rotated cookie, map errors
    async fn execute(&self, service: &'static str, request: RequestBuilder) -> ClientResult<Response> {
        let request = match self.fallback_cookie.read().await.as_deref() {
            Some(cookie) => request.header(FALLBACK_COOKIE_HEADER, cookie),
            None => request,
        };

        let response = request.send().await.map_err(|e| ClientError::Network {
            service,
            source: Box::new(e),
        })?;

        if let Some(cookie) = response
            .headers()
            .get(FALLBACK_COOKIE_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            self.store_cookie(cookie).await?;
        }

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let (message, kind) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => (body.message, body.kind),
            Err(_) if text.is_empty() => (
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string(),
                None,
            ),
            Err(_) => (text, None),
        };

        debug!(service, status = status.as_u16(), message = %message, "Backend rejected request");
        Err(ClientError::from_status(service, status.as_u16(), kind, message))
    }

    async fn store_cookie(&self, cookie: &str) -> ClientResult<()> {
        if !marker_indicates_session(Some(cookie)) {
            return Ok(());
        }
        *self.fallback_cookie.write().await = Some(cookie.to_string());
        self.session.save(cookie).await
    }

    async fn decode<T: DeserializeOwned>(service: &'static str, response: Response) -> ClientResult<T> {
        let bytes = response.bytes().await.map_err(|e| ClientError::Network {
            service,
            source: Box::new(e),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
            service,
            source: Box::new(e),
        })
    }
}
