//! Object storage endpoints and avatar URLs

use crate::client::{AppwriteClient, UNIQUE_ID};
use crate::models::{FileUpload, StoredFile};
use error_types::{ClientError, ClientResult, ValidationError};
use reqwest::multipart::{Form, Part};
use tracing::info;
use url::Url;

const SERVICE: &str = "storage";

impl AppwriteClient {
    fn files_path(&self) -> String {
        format!("/storage/buckets/{}/files", self.config().storage_id)
    }

    /// Multipart upload into the configured bucket
    pub async fn create_file(&self, file: FileUpload) -> ClientResult<StoredFile> {
        let FileUpload {
            name,
            mime_type,
            bytes,
        } = file;

        let part = Part::bytes(bytes)
            .file_name(name.clone())
            .mime_str(&mime_type)
            .map_err(|_| {
                ValidationError::new("Unsupported file").add_field_error(
                    "file",
                    "mime_type",
                    format!("Invalid media type: {}", mime_type),
                )
            })?;
        let form = Form::new().text("fileId", UNIQUE_ID).part("file", part);

        let stored: StoredFile = self
            .post_multipart(SERVICE, &self.files_path(), form)
            .await?;
        info!(file_id = %stored.id, name = %name, size = stored.size_original, "File uploaded");
        Ok(stored)
    }

    pub async fn delete_stored_file(&self, file_id: &str) -> ClientResult<()> {
        self.delete(SERVICE, &format!("{}/{}", self.files_path(), file_id))
            .await?;
        info!(file_id, "File deleted");
        Ok(())
    }

    /// Preview URL constrained by the configured size, crop and quality
    pub fn file_preview_url(&self, file_id: &str) -> ClientResult<Url> {
        if file_id.is_empty() {
            return Err(ClientError::not_found(SERVICE, file_id));
        }
        let preview = self.preview_config();
        self.signed_url(
            &format!("{}/{}/preview", self.files_path(), file_id),
            &[
                ("width", preview.width.to_string()),
                ("height", preview.height.to_string()),
                ("gravity", preview.gravity.clone()),
                ("quality", preview.quality.to_string()),
            ],
        )
    }

    /// Initials avatar used as the default profile image
    pub fn initials_avatar_url(&self, name: &str) -> ClientResult<Url> {
        self.signed_url("/avatars/initials", &[("name", name.to_string())])
    }

    /// Absolute URL carrying the project id, loadable without headers
    fn signed_url(&self, path: &str, params: &[(&str, String)]) -> ClientResult<Url> {
        let mut url = Url::parse(&self.url(path))
            .map_err(|e| ClientError::configuration(format!("Invalid URL for {}: {}", path, e)))?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair("project", &self.config().project_id);
        Ok(url)
    }
}
