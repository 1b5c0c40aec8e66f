//! Backend identifiers and preview settings

use error_types::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

/// Identifiers of the hosted backend project
///
/// None of these have defaults: they are always supplied externally.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AppwriteConfig {
    /// API endpoint, e.g. `https://cloud.appwrite.io/v1`
    #[validate(url)]
    pub endpoint: String,

    /// Project id sent with every request
    #[validate(length(min = 1))]
    pub project_id: String,

    /// Database holding the collections below
    #[validate(length(min = 1))]
    pub database_id: String,

    /// Storage bucket for post and avatar images
    #[validate(length(min = 1))]
    pub storage_id: String,

    /// Users collection
    #[validate(length(min = 1))]
    pub user_collection_id: String,

    /// Posts collection
    #[validate(length(min = 1))]
    pub post_collection_id: String,

    /// Saved-post records collection
    #[validate(length(min = 1))]
    pub saves_collection_id: String,
}

impl AppwriteConfig {
    /// Parsed endpoint, without a trailing slash
    pub fn endpoint_url(&self) -> ClientResult<Url> {
        Url::parse(self.endpoint.trim_end_matches('/')).map_err(|e| {
            ClientError::configuration(format!("Invalid endpoint {}: {}", self.endpoint, e))
        })
    }

    /// Endpoint joined with an API path
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), path)
    }
}

/// Size and crop constraints for generated image previews
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PreviewConfig {
    #[validate(range(min = 1, max = 4000))]
    pub width: u32,

    #[validate(range(min = 1, max = 4000))]
    pub height: u32,

    /// Crop anchor (center, top, bottom, left, right, ...)
    #[validate(length(min = 1))]
    pub gravity: String,

    #[validate(range(min = 0, max = 100))]
    pub quality: u32,
}
