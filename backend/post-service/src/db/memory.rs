//! In-process [`ContentStore`] for local runs and tests.
//!
//! Records live in insertion-ordered vectors behind a single `RwLock`; the
//! insertion index breaks ties when sorting so listings are stable.

use super::ContentStore;
use crate::error::{AppError, Result, DUPLICATE_TITLE_MSG};
use crate::models::{
    has_liked, Comment, CommentChanges, Like, NewComment, NewPost, Post, PostChanges, PostQuery,
    SortField,
};
use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

impl Tables {
    fn post_mut(&mut self, post_id: Uuid) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id == post_id)
    }

    fn comment_mut(&mut self, post_id: Uuid, comment_id: Uuid) -> Option<&mut Comment> {
        self.comments
            .iter_mut()
            .find(|c| c.id == comment_id && c.post_id == post_id)
    }

    fn title_taken(&self, title: &str, except: Option<Uuid>) -> bool {
        self.posts
            .iter()
            .any(|p| p.title == title && Some(p.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryContentStore {
    tables: RwLock<Tables>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_query(post: &Post, query: &PostQuery) -> bool {
    if let Some(author_id) = query.author_id {
        if post.author_id != author_id {
            return false;
        }
    }

    match &query.search {
        Some(search) => {
            let needle = search.to_lowercase();
            post.title.to_lowercase().contains(&needle) || post.body.to_lowercase().contains(&needle)
        }
        None => true,
    }
}

fn compare_posts(a: &Post, b: &Post, field: SortField) -> Ordering {
    match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Title => a.title.cmp(&b.title),
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;

        let mut hits: Vec<(usize, &Post)> = tables
            .posts
            .iter()
            .enumerate()
            .filter(|(_, post)| matches_query(post, query))
            .collect();

        hits.sort_by(|(ia, a), (ib, b)| {
            let ord = compare_posts(a, b, query.sort.field).then(ia.cmp(ib));
            if query.sort.descending {
                ord.reverse()
            } else {
                ord
            }
        });

        Ok(hits
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .map(|(_, post)| post.clone())
            .collect())
    }

    async fn count_posts(&self) -> Result<i64> {
        Ok(self.tables.read().await.posts.len() as i64)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == post_id).cloned())
    }

    async fn insert_post(&self, post: NewPost) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        if tables.title_taken(&post.title, None) {
            return Err(AppError::Conflict(DUPLICATE_TITLE_MSG.to_string()));
        }

        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            author_id: post.author_id,
            title: post.title,
            body: post.body,
            comments: Vec::new(),
            likes: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.posts.push(post.clone());
        Ok(Some(post))
    }

    async fn update_post(&self, post_id: Uuid, changes: PostChanges) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        if let Some(title) = &changes.title {
            if tables.title_taken(title, Some(post_id)) {
                return Err(AppError::Conflict(DUPLICATE_TITLE_MSG.to_string()));
            }
        }

        let Some(post) = tables.post_mut(post_id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(body) = changes.body {
            post.body = body;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .posts
            .iter()
            .position(|p| p.id == post_id)
            .map(|idx| tables.posts.remove(idx)))
    }

    async fn push_post_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        Ok(tables.post_mut(post_id).map(|post| {
            post.comments.push(comment_id);
            post.updated_at = Utc::now();
            post.clone()
        }))
    }

    async fn pull_post_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        Ok(tables.post_mut(post_id).map(|post| {
            post.comments.retain(|id| *id != comment_id);
            post.updated_at = Utc::now();
            post.clone()
        }))
    }

    async fn push_post_like(&self, post_id: Uuid, like: Like) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .post_mut(post_id)
            .filter(|post| !has_liked(&post.likes, like.user_id))
            .map(|post| {
                post.likes.push(like);
                post.updated_at = Utc::now();
                post.clone()
            }))
    }

    async fn pull_post_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Post>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .post_mut(post_id)
            .filter(|post| has_liked(&post.likes, user_id))
            .map(|post| {
                post.likes.retain(|like| like.user_id != user_id);
                post.updated_at = Utc::now();
                post.clone()
            }))
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .rev()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn find_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .iter()
            .find(|c| c.id == comment_id && c.post_id == post_id)
            .cloned())
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>> {
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: comment.post_id,
            commenter_id: comment.commenter_id,
            comment: comment.comment,
            likes: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.comments.push(comment.clone());
        Ok(Some(comment))
    }

    async fn update_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        changes: CommentChanges,
    ) -> Result<Option<Comment>> {
        let mut tables = self.tables.write().await;
        Ok(tables.comment_mut(post_id, comment_id).map(|comment| {
            comment.comment = changes.comment;
            comment.updated_at = Utc::now();
            comment.clone()
        }))
    }

    async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Comment>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .comments
            .iter()
            .position(|c| c.id == comment_id && c.post_id == post_id)
            .map(|idx| tables.comments.remove(idx)))
    }

    async fn delete_post_comments(&self, post_id: Uuid) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.post_id != post_id);
        Ok((before - tables.comments.len()) as u64)
    }

    async fn push_comment_like(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        like: Like,
    ) -> Result<Option<Comment>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .comment_mut(post_id, comment_id)
            .filter(|comment| !has_liked(&comment.likes, like.user_id))
            .map(|comment| {
                comment.likes.push(like);
                comment.updated_at = Utc::now();
                comment.clone()
            }))
    }

    async fn pull_comment_like(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Comment>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .comment_mut(post_id, comment_id)
            .filter(|comment| has_liked(&comment.likes, user_id))
            .map(|comment| {
                comment.likes.retain(|like| like.user_id != user_id);
                comment.updated_at = Utc::now();
                comment.clone()
            }))
    }
}
