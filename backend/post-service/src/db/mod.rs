/// Persistence layer for posts and comments
///
/// Services talk to storage only through [`ContentStore`]. Write operations
/// return `Ok(None)` when the store produced no record (unknown id, or a
/// conditional update whose condition no longer holds); callers turn that
/// into their retry-later failure.
use crate::error::Result;
use crate::models::{Comment, CommentChanges, Like, NewComment, NewPost, Post, PostChanges, PostQuery};
use async_trait::async_trait;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryContentStore;
pub use postgres::PgContentStore;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Cheap liveness probe for health checks.
    async fn ping(&self) -> Result<()>;

    // Posts

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>>;

    async fn count_posts(&self) -> Result<i64>;

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>>;

    /// Fails with `Conflict` when the title is already taken.
    async fn insert_post(&self, post: NewPost) -> Result<Option<Post>>;

    /// Fails with `Conflict` when the new title is already taken.
    async fn update_post(&self, post_id: Uuid, changes: PostChanges) -> Result<Option<Post>>;

    async fn delete_post(&self, post_id: Uuid) -> Result<Option<Post>>;

    /// Append a comment id to the post's comment list.
    async fn push_post_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Post>>;

    /// Remove a comment id from the post's comment list.
    async fn pull_post_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Post>>;

    /// Append `like` unless its user already liked the post.
    async fn push_post_like(&self, post_id: Uuid, like: Like) -> Result<Option<Post>>;

    /// Remove the user's like; `None` if the user had not liked the post.
    async fn pull_post_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Post>>;

    // Comments

    /// Comments of a post, newest first.
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>>;

    async fn find_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Comment>>;

    async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>>;

    async fn update_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        changes: CommentChanges,
    ) -> Result<Option<Comment>>;

    async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Comment>>;

    /// Delete every comment of a post; returns how many were removed.
    async fn delete_post_comments(&self, post_id: Uuid) -> Result<u64>;

    async fn push_comment_like(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        like: Like,
    ) -> Result<Option<Comment>>;

    async fn pull_comment_like(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Comment>>;
}
