//! Auth session context
//!
//! ```text
//!            bootstrap / check_auth_user
//! Unauthenticated ───────────────▶ Checking ──ok──▶ Authenticated(user)
//!        ▲                            │
//!        └──────────── error ─────────┘
//!        ▲
//!        └──────── sign_out ◀──────── Authenticated
//! ```
//!
//! Constructed once and passed explicitly to whatever needs the current
//! user. Observers follow state changes through [`SessionContext::subscribe`].

use crate::forms::{SigninForm, SignupForm};
use crate::queries::SnapgramQueries;
use appwrite_facade::UserDocument;
use error_types::{ClientError, ClientResult};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};
use validator::Validate;

pub const SIGN_UP_FAILED: &str = "Sign up failed. Please try again.";
pub const SIGN_IN_FAILED: &str = "Sign in failed. Please try again.";
pub const SIGN_OUT_FAILED: &str = "Sign out failed. Please try again.";

/// Screens the session flows navigate between
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    SignIn,
    SignUp,
    Explore,
    Profile(String),
    UpdateProfile(String),
}

/// Routing seam implemented by the presentation layer
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// User-visible notification seam (toasts)
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// The signed-in user as the screens see it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
    pub image_url: String,
    pub bio: String,
}

impl From<&UserDocument> for SessionUser {
    fn from(user: &UserDocument) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            image_url: user.image_url.clone(),
            bio: user.bio.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Checking,
    Authenticated(SessionUser),
}

pub struct SessionContext {
    queries: Arc<SnapgramQueries>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<AuthState>,
}

impl SessionContext {
    pub fn new(
        queries: Arc<SnapgramQueries>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            queries,
            navigator,
            notifier,
            state,
        }
    }

    pub fn queries(&self) -> &Arc<SnapgramQueries> {
        &self.queries
    }

    pub(crate) fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub(crate) fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    // ===== State =====

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn user(&self) -> Option<SessionUser> {
        match &*self.state.borrow() {
            AuthState::Authenticated(user) => Some(user.clone()),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state.borrow(), AuthState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(*self.state.borrow(), AuthState::Checking)
    }

    /// Replace fields of the signed-in user; no-op when signed out
    pub fn update_user<F>(&self, update: F)
    where
        F: FnOnce(&mut SessionUser),
    {
        self.state.send_if_modified(|state| match state {
            AuthState::Authenticated(user) => {
                update(user);
                true
            }
            _ => false,
        });
    }

    // ===== Flows =====

    /// Startup: redirect to sign-in when no local marker exists, then
    /// resolve the current user either way
    pub async fn bootstrap(&self) -> bool {
        if !self.queries.backend().restore_session().await {
            debug!("No session marker, redirecting to sign-in");
            self.navigator.navigate(Route::SignIn);
        }
        self.check_auth_user().await
    }

    /// Resolve the current user from the backend; true when authenticated
    pub async fn check_auth_user(&self) -> bool {
        self.state.send_replace(AuthState::Checking);

        let result = self.queries.current_user().run().await;
        match result {
            Some(Ok(user)) => {
                info!(user_id = %user.id, "Session authenticated");
                self.state
                    .send_replace(AuthState::Authenticated(SessionUser::from(&user)));
                true
            }
            Some(Err(e)) => {
                e.log();
                self.state.send_replace(AuthState::Unauthenticated);
                false
            }
            None => {
                self.state.send_replace(AuthState::Unauthenticated);
                false
            }
        }
    }

    /// Validate, create the account, sign in, check, go home
    pub async fn sign_up(&self, form: SignupForm) -> ClientResult<SessionUser> {
        let email = form.email.clone();
        let password = form.password.clone();
        let new_user = form.into_new_user()?;

        if let Err(e) = self.queries.create_user_account(new_user).await {
            self.notifier.notify(SIGN_UP_FAILED);
            return Err(e);
        }

        if let Err(e) = self.queries.sign_in_account(&email, &password).await {
            self.notifier.notify(SIGN_IN_FAILED);
            return Err(e);
        }

        self.finish_sign_in(SIGN_UP_FAILED).await
    }

    /// Validate, sign in, check, go home
    pub async fn sign_in(&self, form: SigninForm) -> ClientResult<SessionUser> {
        form.validate()?;

        if let Err(e) = self.queries.sign_in_account(&form.email, &form.password).await {
            self.notifier.notify(SIGN_IN_FAILED);
            return Err(e);
        }

        self.finish_sign_in(SIGN_UP_FAILED).await
    }

    async fn finish_sign_in(&self, failure: &str) -> ClientResult<SessionUser> {
        if self.check_auth_user().await {
            if let Some(user) = self.user() {
                self.navigator.navigate(Route::Home);
                return Ok(user);
            }
        }
        self.notifier.notify(failure);
        Err(ClientError::Unauthenticated)
    }

    /// Delete the remote session, clear the marker and cache, go to sign-in
    ///
    /// On failure the local session is left as it was.
    pub async fn sign_out(&self) -> ClientResult<()> {
        if let Err(e) = self.queries.sign_out_account().await {
            self.notifier.notify(SIGN_OUT_FAILED);
            return Err(e);
        }
        self.state.send_replace(AuthState::Unauthenticated);
        self.navigator.navigate(Route::SignIn);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_user_defaults_missing_bio() {
        let doc = UserDocument {
            id: "u1".into(),
            account_id: "a1".into(),
            name: "Ada".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            image_url: "https://img/ada".into(),
            image_id: None,
            bio: None,
            liked: vec![],
            save: vec![],
        };
        let user = SessionUser::from(&doc);
        assert_eq!(user.bio, "");
        assert_eq!(user.id, "u1");
    }
}
