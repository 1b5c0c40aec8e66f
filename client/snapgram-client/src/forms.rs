//! Form schemas, checked before any backend call

use appwrite_facade::{FileUpload, NewPost, NewUser, PostDocument, UpdatePost};
use error_types::{ClientResult, ValidationError};
use validator::Validate;

#[derive(Debug, Clone, Validate)]
pub struct SignupForm {
    #[validate(length(min = 2, message = "Too short"))]
    pub name: String,
    #[validate(length(min = 2, message = "Too short"))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
}

impl SignupForm {
    pub fn into_new_user(self) -> ClientResult<NewUser> {
        self.validate()?;
        Ok(NewUser {
            name: self.name,
            username: self.username,
            email: self.email,
            password: self.password,
        })
    }
}

#[derive(Debug, Clone, Validate)]
pub struct SigninForm {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
}

#[derive(Debug, Clone, Validate)]
pub struct ProfileForm {
    pub file: Option<FileUpload>,
    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    pub name: String,
    #[validate(length(min = 2, message = "Name must be at least 2 characters."))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    pub bio: String,
}

#[derive(Debug, Clone, Validate)]
pub struct PostForm {
    #[validate(length(min = 5, max = 2200))]
    pub caption: String,
    pub file: Option<FileUpload>,
    #[validate(length(min = 2, max = 100))]
    pub location: String,
    pub tags: String,
}

impl PostForm {
    /// New post by `user_id`; an image is mandatory
    pub fn into_new_post(self, user_id: &str) -> ClientResult<NewPost> {
        self.validate()?;
        let file = self.file.ok_or_else(|| {
            ValidationError::new("An image is required").add_field_error(
                "file",
                "required",
                "Add a photo to the post",
            )
        })?;
        Ok(NewPost {
            user_id: user_id.to_string(),
            caption: self.caption,
            file,
            location: Some(self.location),
            tags: Some(self.tags),
        })
    }

    /// Edit of `post`, keeping its image unless a new file is attached
    pub fn into_update(self, post: &PostDocument) -> ClientResult<UpdatePost> {
        self.validate()?;
        Ok(UpdatePost {
            post_id: post.id.clone(),
            caption: self.caption,
            image_id: post.image_id.clone(),
            image_url: post.image_url.clone(),
            file: self.file,
            location: Some(self.location),
            tags: Some(self.tags),
        })
    }

    /// Prefilled from an existing post, tags joined with commas
    pub fn from_post(post: &PostDocument) -> Self {
        Self {
            caption: post.caption.clone(),
            file: None,
            location: post.location.clone().unwrap_or_default(),
            tags: post.tags.join(","),
        }
    }
}
