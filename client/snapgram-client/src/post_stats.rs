//! Like and save toggles for a post card

use crate::queries::SnapgramQueries;
use appwrite_facade::{PostDocument, UserDocument};
use error_types::ClientResult;
use tracing::debug;

/// Liker ids after `user_id` toggles their like on `post`
pub fn toggled_likes(post: &PostDocument, user_id: &str) -> Vec<String> {
    let mut likes = post.liker_ids();
    if let Some(pos) = likes.iter().position(|id| id == user_id) {
        likes.remove(pos);
    } else {
        likes.push(user_id.to_string());
    }
    likes
}

/// Like or unlike; returns the updated post
pub async fn toggle_like(
    queries: &SnapgramQueries,
    post: &PostDocument,
    user_id: &str,
) -> ClientResult<PostDocument> {
    let likes = toggled_likes(post, user_id);
    debug!(post_id = %post.id, likers = likes.len(), "Toggling like");
    queries.like_post(&post.id, likes).await
}

/// Save or unsave `post` for `user`; returns whether it is now saved
pub async fn toggle_save(
    queries: &SnapgramQueries,
    user: &UserDocument,
    post: &PostDocument,
) -> ClientResult<bool> {
    match user.saved_record_for(&post.id) {
        Some(record_id) => {
            queries.delete_saved_post(record_id).await?;
            Ok(false)
        }
        None => {
            queries.save_post(&user.id, &post.id).await?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appwrite_facade::Relation;
    use chrono::Utc;

    fn post_liked_by(ids: &[&str]) -> PostDocument {
        PostDocument {
            id: "p1".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            creator: Relation::Id("u9".into()),
            caption: "sunset".into(),
            image_url: "https://img/p1".into(),
            image_id: "f1".into(),
            location: None,
            tags: vec![],
            likes: ids.iter().map(|id| Relation::Id(id.to_string())).collect(),
        }
    }

    #[test]
    fn test_like_adds_user() {
        let post = post_liked_by(&["u2"]);
        assert_eq!(toggled_likes(&post, "u1"), vec!["u2", "u1"]);
    }

    #[test]
    fn test_unlike_removes_user() {
        let post = post_liked_by(&["u1", "u2"]);
        assert_eq!(toggled_likes(&post, "u1"), vec!["u2"]);
    }
}
