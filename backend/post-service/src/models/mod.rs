/// Data models for post-service
///
/// - Post: a titled text post owning its like list and comment references
/// - Comment: a comment on a post, owning its own like list
/// - Like: embedded record of one user liking a post or comment
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

mod query;

pub use query::{total_pages, PostQuery, SortField, SortKey, PAGE_SIZE};

/// One user's like on a post or comment. At most one per user per target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    #[serde(rename = "userID")]
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    /// Ids of this post's comments, oldest first.
    #[sqlx(rename = "comment_ids")]
    pub comments: Vec<Uuid>,
    #[sqlx(json)]
    pub likes: Vec<Like>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    #[serde(rename = "postID")]
    pub post_id: Uuid,
    #[serde(rename = "commenterID")]
    pub commenter_id: Uuid,
    pub comment: String,
    #[sqlx(json)]
    pub likes: Vec<Like>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns true when `user_id` already has a like in `likes`.
pub fn has_liked(likes: &[Like], user_id: Uuid) -> bool {
    likes.iter().any(|like| like.user_id == user_id)
}

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewPost {
    pub author_id: Uuid,
    #[validate(length(
        min = 1,
        max = 200,
        message = "Post title must be between 1 and 200 characters."
    ))]
    pub title: String,
    #[validate(length(min = 1, message = "Please provide the post's body."))]
    pub body: String,
}

/// Partial update of a post. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct PostChanges {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Post title must be between 1 and 200 characters."
    ))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Please provide the post's body."))]
    pub body: Option<String>,
}

impl PostChanges {
    /// Empty strings count as "not provided".
    pub fn new(title: Option<String>, body: Option<String>) -> Self {
        Self {
            title: title.filter(|t| !t.is_empty()),
            body: body.filter(|b| !b.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewComment {
    pub post_id: Uuid,
    pub commenter_id: Uuid,
    #[validate(length(
        min = 1,
        max = 200,
        message = "Comment must be between 1 and 200 characters."
    ))]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct CommentChanges {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Comment must be between 1 and 200 characters."
    ))]
    pub comment: String,
}
