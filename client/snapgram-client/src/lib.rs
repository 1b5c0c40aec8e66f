//! Snapgram client core
//!
//! This library provides:
//! - [`SnapgramQueries`]: every backend operation as a cached query or an
//!   invalidating mutation over one [`query_cache::QueryCache`]
//! - [`SessionContext`]: the signed-in user, session bootstrap and the
//!   sign-up / sign-in / sign-out flows
//! - [`ExploreController`]: feed vs. search display with infinite scroll
//! - Form schemas, profile editing, like/save toggles
//! - [`Debouncer`]: quiet-period sampling of raw input
//!
//! Rendering is left to the caller: screens receive plain state and report
//! navigation and notifications through the [`Navigator`] and [`Notifier`]
//! seams.

pub mod app;
pub mod auth;
pub mod debounce;
pub mod explore;
pub mod forms;
pub mod post_stats;
pub mod profile;
pub mod queries;

pub use app::SnapgramApp;
pub use auth::{AuthState, Navigator, Notifier, Route, SessionContext, SessionUser};
pub use debounce::Debouncer;
pub use explore::{DisplayMode, ExploreController, ExploreView};
pub use forms::{PostForm, ProfileForm, SigninForm, SignupForm};
pub use queries::{keys, invalidation, PostPage, SnapgramQueries};
