//! Like/unlike rules shared by posts and comments.

use crate::error::{AppError, Result};
use crate::metrics::content::record_like;
use crate::models::{has_liked, Like};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Post,
    Comment,
}

impl LikeTarget {
    pub fn noun(self) -> &'static str {
        match self {
            LikeTarget::Post => "post",
            LikeTarget::Comment => "comment",
        }
    }
}

/// A user may like a target at most once.
pub fn ensure_can_like(target: LikeTarget, likes: &[Like], user_id: Uuid) -> Result<()> {
    if has_liked(likes, user_id) {
        return Err(AppError::BadRequest(format!(
            "You have already liked the {}.",
            target.noun()
        )));
    }
    Ok(())
}

/// Unliking requires an existing like by the same user.
pub fn ensure_can_unlike(target: LikeTarget, likes: &[Like], user_id: Uuid) -> Result<()> {
    if !has_liked(likes, user_id) {
        return Err(AppError::BadRequest(format!(
            "You have not already liked the {}.",
            target.noun()
        )));
    }
    Ok(())
}

/// Turn a conditional like write into the caller-facing result.
pub(crate) fn finish<T>(target: LikeTarget, op: &str, written: Option<T>) -> Result<T> {
    match written {
        Some(value) => {
            record_like(target.noun(), op);
            Ok(value)
        }
        None => Err(AppError::Internal(format!(
            "Unable to {} the {}, please try again later.",
            op,
            target.noun()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_like_is_rejected() {
        let user = Uuid::new_v4();
        let likes = vec![Like::new(user)];

        let err = ensure_can_like(LikeTarget::Post, &likes, user).unwrap_err();
        assert_eq!(err.to_string(), "You have already liked the post.");
        assert!(ensure_can_like(LikeTarget::Post, &likes, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_unlike_requires_existing_like() {
        let err = ensure_can_unlike(LikeTarget::Comment, &[], Uuid::new_v4()).unwrap_err();
        assert_eq!(err.to_string(), "You have not already liked the comment.");
    }

    #[test]
    fn test_lost_race_maps_to_internal() {
        let err = finish::<()>(LikeTarget::Comment, "unlike", None).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(
            err.to_string(),
            "Unable to unlike the comment, please try again later."
        );
    }
}
