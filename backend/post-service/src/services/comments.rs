/// Comment service - comment CRUD scoped to a parent post, plus likes
///
/// Creating or deleting a comment touches two records (the comment and the
/// parent post's comment list). Creation compensates a failed attach by
/// deleting the new comment; deletion does not compensate.
use super::likes::{self, LikeTarget};
use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::metrics::content::{record_comment_op, record_comment_rollback};
use crate::models::{Comment, CommentChanges, Like, NewComment, Post};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const MISSING_COMMENT_FIELDS: &str =
    "Please provide all the necessary information for the comment.";
const COMMENT_NOT_FOUND: &str = "No comment found with the given commentID.";
const ADD_COMMENT_FAILED: &str = "Unable to add the comment, please try again later.";
const DELETE_COMMENT_FAILED: &str = "Unable to delete the comment, please try again later.";

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn ContentStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// All comments of a post, newest first.
    pub async fn list_post_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        self.store.list_comments(post_id).await
    }

    pub async fn get_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Comment> {
        self.store
            .find_comment(post_id, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(COMMENT_NOT_FOUND.to_string()))
    }

    /// Insert a comment and attach it to its post.
    ///
    /// If the attach step yields nothing or fails, the new comment is deleted
    /// again so no orphan survives.
    pub async fn add_post_comment(
        &self,
        post_id: Uuid,
        commenter_id: Uuid,
        text: Option<String>,
    ) -> Result<(Post, Comment)> {
        let comment = text
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::BadRequest(MISSING_COMMENT_FIELDS.to_string()))?;

        let new_comment = NewComment {
            post_id,
            commenter_id,
            comment,
        };
        new_comment.validate()?;

        let comment = self
            .store
            .insert_comment(new_comment)
            .await?
            .ok_or_else(|| AppError::Internal(ADD_COMMENT_FAILED.to_string()))?;

        match self.store.push_post_comment(post_id, comment.id).await {
            Ok(Some(post)) => {
                record_comment_op("create");
                tracing::info!(
                    post_id = %post_id,
                    comment_id = %comment.id,
                    user_id = %commenter_id,
                    "Comment added"
                );
                Ok((post, comment))
            }
            Ok(None) => {
                tracing::warn!(
                    post_id = %post_id,
                    comment_id = %comment.id,
                    "Parent post missing while attaching comment, rolling back"
                );
                self.roll_back_comment(post_id, comment.id).await;
                Err(AppError::Internal(ADD_COMMENT_FAILED.to_string()))
            }
            Err(e) => {
                tracing::warn!(
                    post_id = %post_id,
                    comment_id = %comment.id,
                    error = %e,
                    "Failed to attach comment to post, rolling back"
                );
                self.roll_back_comment(post_id, comment.id).await;
                Err(AppError::Internal(ADD_COMMENT_FAILED.to_string()))
            }
        }
    }

    async fn roll_back_comment(&self, post_id: Uuid, comment_id: Uuid) {
        match self.store.delete_comment(post_id, comment_id).await {
            Ok(Some(_)) => record_comment_rollback("ok"),
            Ok(None) => {
                record_comment_rollback("missing");
                tracing::warn!(comment_id = %comment_id, "Rolled-back comment was already gone");
            }
            Err(e) => {
                record_comment_rollback("failed");
                tracing::error!(
                    post_id = %post_id,
                    comment_id = %comment_id,
                    error = %e,
                    "Failed to roll back orphaned comment"
                );
            }
        }
    }

    pub async fn update_post_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        text: Option<String>,
    ) -> Result<Comment> {
        let comment = text
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::BadRequest(MISSING_COMMENT_FIELDS.to_string()))?;

        let changes = CommentChanges { comment };
        changes.validate()?;

        let comment = self
            .store
            .update_comment(post_id, comment_id, changes)
            .await?
            .ok_or_else(|| {
                AppError::Internal(
                    "Unable to update the comment, please try again later.".to_string(),
                )
            })?;

        record_comment_op("update");
        tracing::info!(post_id = %post_id, comment_id = %comment_id, "Comment updated");
        Ok(comment)
    }

    /// Delete a comment, then detach it from its post.
    pub async fn delete_post_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<(Post, Comment)> {
        let comment = self
            .store
            .delete_comment(post_id, comment_id)
            .await?
            .ok_or_else(|| AppError::Internal(DELETE_COMMENT_FAILED.to_string()))?;

        let post = match self.store.pull_post_comment(post_id, comment_id).await {
            Ok(Some(post)) => post,
            outcome => {
                tracing::warn!(
                    post_id = %post_id,
                    comment_id = %comment_id,
                    error = ?outcome.err(),
                    "Comment deleted but parent post could not be updated"
                );
                return Err(AppError::Internal(DELETE_COMMENT_FAILED.to_string()));
            }
        };

        record_comment_op("delete");
        tracing::info!(post_id = %post_id, comment_id = %comment_id, "Comment deleted");
        Ok((post, comment))
    }

    pub async fn like_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Comment> {
        let comment = self.get_comment(post_id, comment_id).await?;
        likes::ensure_can_like(LikeTarget::Comment, &comment.likes, user_id)?;

        let written = self
            .store
            .push_comment_like(post_id, comment_id, Like::new(user_id))
            .await?;
        likes::finish(LikeTarget::Comment, "like", written)
    }

    pub async fn unlike_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Comment> {
        let comment = self.get_comment(post_id, comment_id).await?;
        likes::ensure_can_unlike(LikeTarget::Comment, &comment.likes, user_id)?;

        let written = self
            .store
            .pull_comment_like(post_id, comment_id, user_id)
            .await?;
        likes::finish(LikeTarget::Comment, "unlike", written)
    }
}
