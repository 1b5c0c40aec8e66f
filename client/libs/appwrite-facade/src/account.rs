//! Account and session endpoints

use crate::client::{AppwriteClient, UNIQUE_ID};
use crate::models::{AccountInfo, SessionInfo};
use error_types::ClientResult;
use serde_json::json;
use tracing::info;

const SERVICE: &str = "account";

impl AppwriteClient {
    /// `POST /account` with a backend-generated id
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> ClientResult<AccountInfo> {
        let account: AccountInfo = self
            .post(
                SERVICE,
                "/account",
                &json!({
                    "userId": UNIQUE_ID,
                    "email": email,
                    "password": password,
                    "name": name,
                }),
            )
            .await?;
        info!(account_id = %account.id, "Account created");
        Ok(account)
    }

    /// `POST /account/sessions/email`; the returned fallback cookie is persisted
    pub async fn create_email_session(&self, email: &str, password: &str) -> ClientResult<SessionInfo> {
        let session: SessionInfo = self
            .post(
                SERVICE,
                "/account/sessions/email",
                &json!({ "email": email, "password": password }),
            )
            .await?;
        info!(user_id = %session.user_id, "Session created");
        Ok(session)
    }

    /// `GET /account` for the session's account
    pub async fn get_account(&self) -> ClientResult<AccountInfo> {
        self.get(SERVICE, "/account", &[]).await
    }

    /// `DELETE /account/sessions/current`, then drop the local marker
    pub async fn delete_current_session(&self) -> ClientResult<()> {
        self.delete(SERVICE, "/account/sessions/current").await?;
        self.forget_session().await?;
        info!("Session deleted");
        Ok(())
    }
}
