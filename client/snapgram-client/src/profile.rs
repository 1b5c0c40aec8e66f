//! Profile editing

use crate::auth::{Route, SessionContext};
use crate::forms::ProfileForm;
use appwrite_facade::{UpdateUser, UserDocument};
use error_types::ClientResult;
use tracing::info;
use validator::Validate;

pub const UPDATE_USER_FAILED: &str = "Update user failed. Please try again.";

/// Build the update for `current`, keeping its image unless a file is attached
///
/// Username and email are shown on the form but are not editable.
pub fn profile_update(form: ProfileForm, current: &UserDocument) -> ClientResult<UpdateUser> {
    form.validate()?;
    Ok(UpdateUser {
        user_id: current.id.clone(),
        name: form.name,
        bio: Some(form.bio),
        image_id: current.image_id.clone(),
        image_url: current.image_url.clone(),
        file: form.file,
    })
}

/// Prefill the form from the stored user
pub fn profile_form(user: &UserDocument) -> ProfileForm {
    ProfileForm {
        file: None,
        name: user.name.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        bio: user.bio.clone().unwrap_or_default(),
    }
}

/// Submit the profile form for `current`
///
/// On success the session user picks up the new name, bio and image and the
/// profile screen is shown. On failure the session is left untouched.
pub async fn update_profile(
    session: &SessionContext,
    form: ProfileForm,
    current: &UserDocument,
) -> ClientResult<UserDocument> {
    let update = profile_update(form, current)?;

    let updated = match session.queries().update_user(update).await {
        Ok(user) => user,
        Err(e) => {
            session.notifier().notify(UPDATE_USER_FAILED);
            return Err(e);
        }
    };

    session.update_user(|user| {
        user.name = updated.name.clone();
        user.bio = updated.bio.clone().unwrap_or_default();
        user.image_url = updated.image_url.clone();
    });
    info!(user_id = %updated.id, "Profile updated");

    session
        .navigator()
        .navigate(Route::Profile(updated.id.clone()));
    Ok(updated)
}
