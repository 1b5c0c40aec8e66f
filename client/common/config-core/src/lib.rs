//! Configuration management for the Snapgram client
//!
//! This library provides:
//! - The backend identifiers (endpoint, project, database, bucket, collections)
//! - Feed, search, HTTP and session tunables with built-in defaults
//! - Layered loading (defaults, file, environment) with validation

use error_types::{ClientError, ClientResult};
use serde::Deserialize;
use std::path::Path;
use validator::Validate;

pub mod appwrite;
pub mod feed;
pub mod http;
pub mod session;

// Re-export commonly used types
pub use appwrite::{AppwriteConfig, PreviewConfig};
pub use feed::{FeedConfig, SearchConfig};
pub use http::HttpConfig;
pub use session::SessionConfig;

/// Prefix for environment overrides, e.g. `SNAPGRAM_APPWRITE__PROJECT_ID`
pub const ENV_PREFIX: &str = "SNAPGRAM";

/// Root configuration of the client
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClientConfig {
    /// Remote backend identifiers
    #[validate(nested)]
    pub appwrite: AppwriteConfig,

    /// Image preview constraints
    #[validate(nested)]
    pub preview: PreviewConfig,

    /// Paginated feed settings
    #[validate(nested)]
    pub feed: FeedConfig,

    /// Search input settings
    #[validate(nested)]
    pub search: SearchConfig,

    /// HTTP client settings
    #[validate(nested)]
    pub http: HttpConfig,

    /// Local session marker settings
    pub session: SessionConfig,
}

impl ClientConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// # Loading Order
    /// 1. Built-in defaults (tunables only)
    /// 2. Configuration file, if given and present
    /// 3. Environment variables (highest priority)
    ///
    /// # Environment Variables
    /// Uses the pattern `SNAPGRAM_SECTION__KEY`, for example
    /// `SNAPGRAM_APPWRITE__ENDPOINT=https://cloud.appwrite.io/v1`.
    pub fn load(config_path: Option<&Path>) -> ClientResult<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            include_str!("../config/defaults.toml"),
            config::FileFormat::Toml,
        ));

        if let Some(path) = config_path {
            if path.exists() {
                builder = builder.add_source(config::File::from(path));
            } else {
                tracing::warn!(path = %path.display(), "Config file not found, using environment only");
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build().map_err(|e| {
            ClientError::configuration(format!("Failed to load configuration: {}", e))
        })?;

        let config: ClientConfig = settings.try_deserialize().map_err(|e| {
            ClientError::configuration(format!("Failed to deserialize configuration: {}", e))
        })?;

        config.validate_all()?;

        tracing::debug!(
            endpoint = %config.appwrite.endpoint,
            project = %config.appwrite.project_id,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Run field validation plus cross-field checks
    pub fn validate_all(&self) -> ClientResult<()> {
        Validate::validate(self).map_err(|e| {
            ClientError::configuration(format!("Configuration validation failed: {}", e))
        })?;

        // The endpoint is joined with REST paths, so it must parse as a base URL
        self.appwrite.endpoint_url()?;

        Ok(())
    }
}
