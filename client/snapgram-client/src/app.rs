use crate::auth::{Navigator, Notifier, SessionContext};
use crate::explore::ExploreController;
use crate::queries::SnapgramQueries;
use appwrite_facade::{FileSessionStore, SnapgramApi, SnapgramBackend};
use config_core::ClientConfig;
use error_types::ClientResult;
use query_cache::QueryCache;
use std::sync::Arc;
use tracing::info;

/// Everything a client session needs, wired once at startup
pub struct SnapgramApp {
    config: ClientConfig,
    queries: Arc<SnapgramQueries>,
    session: SessionContext,
}

impl SnapgramApp {
    pub fn new(
        config: ClientConfig,
        backend: Arc<dyn SnapgramBackend>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let queries = Arc::new(SnapgramQueries::new(backend, QueryCache::new()));
        let session = SessionContext::new(Arc::clone(&queries), navigator, notifier);
        Self {
            config,
            queries,
            session,
        }
    }

    /// Backend client over HTTP, session marker stored at the configured path
    pub fn from_config(
        config: ClientConfig,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> ClientResult<Self> {
        let store = Arc::new(FileSessionStore::new(&config.session.marker_path));
        let api = SnapgramApi::from_config(&config, store)?;
        info!(
            endpoint = %config.appwrite.endpoint,
            project = %config.appwrite.project_id,
            "Snapgram client configured"
        );
        Ok(Self::new(config, Arc::new(api), navigator, notifier))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn queries(&self) -> &Arc<SnapgramQueries> {
        &self.queries
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Explore screen using the configured debounce delay
    pub fn explore(&self) -> ExploreController {
        ExploreController::new(Arc::clone(&self.queries), self.config.search.debounce())
    }
}
