/// Post service - listing, creation, updates, cascade delete and likes
use super::likes::{self, LikeTarget};
use crate::db::ContentStore;
use crate::error::{AppError, Result};
use crate::metrics::content::record_post_op;
use crate::models::{total_pages, Like, NewPost, Post, PostChanges, PostQuery};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

const MISSING_POST_FIELDS: &str = "Please provide all the necessary information for the post.";
const POST_NOT_FOUND: &str = "No post found with the given postID.";

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn ContentStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// One page of posts matching the query.
    pub async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
        self.store.list_posts(query).await
    }

    /// Page count over the whole, unfiltered collection.
    pub async fn total_pages(&self) -> Result<i64> {
        let count = self.store.count_posts().await?;
        Ok(total_pages(count))
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Post> {
        self.store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(POST_NOT_FOUND.to_string()))
    }

    pub async fn add_post(
        &self,
        author_id: Uuid,
        title: Option<String>,
        body: Option<String>,
    ) -> Result<Post> {
        let (title, body) = match (
            title.filter(|t| !t.is_empty()),
            body.filter(|b| !b.is_empty()),
        ) {
            (Some(title), Some(body)) => (title, body),
            _ => return Err(AppError::BadRequest(MISSING_POST_FIELDS.to_string())),
        };

        let new_post = NewPost {
            author_id,
            title,
            body,
        };
        new_post.validate()?;

        let post = self.store.insert_post(new_post).await?.ok_or_else(|| {
            AppError::Internal("Unable to create the post, please try again later.".to_string())
        })?;

        record_post_op("create");
        tracing::info!(post_id = %post.id, user_id = %author_id, "Post created");
        Ok(post)
    }

    /// Partial update of title/body. Empty strings are ignored.
    pub async fn update_post(
        &self,
        post_id: Uuid,
        title: Option<String>,
        body: Option<String>,
    ) -> Result<Post> {
        let changes = PostChanges::new(title, body);
        changes.validate()?;

        let updated = if changes.is_empty() {
            self.store.find_post(post_id).await?
        } else {
            self.store.update_post(post_id, changes).await?
        };

        let post = updated.ok_or_else(|| {
            AppError::Internal("Unable to update the post, please try again later.".to_string())
        })?;

        record_post_op("update");
        tracing::info!(post_id = %post.id, "Post updated");
        Ok(post)
    }

    /// Delete a post, then every comment that belongs to it.
    pub async fn delete_post(&self, post_id: Uuid) -> Result<Post> {
        let post = self.store.delete_post(post_id).await?.ok_or_else(|| {
            AppError::Internal("Unable to delete the post, please try again later.".to_string())
        })?;

        match self.store.delete_post_comments(post_id).await {
            Ok(removed) => {
                tracing::info!(post_id = %post_id, comments_removed = removed, "Post deleted");
            }
            Err(e) => {
                tracing::warn!(
                    post_id = %post_id,
                    error = %e,
                    "Post deleted but its comments could not be removed"
                );
                return Err(e);
            }
        }

        record_post_op("delete");
        Ok(post)
    }

    pub async fn like_post(&self, post_id: Uuid, user_id: Uuid) -> Result<Post> {
        let post = self.get_post(post_id).await?;
        likes::ensure_can_like(LikeTarget::Post, &post.likes, user_id)?;

        let written = self.store.push_post_like(post_id, Like::new(user_id)).await?;
        let post = likes::finish(LikeTarget::Post, "like", written)?;
        tracing::debug!(post_id = %post_id, user_id = %user_id, "Post liked");
        Ok(post)
    }

    pub async fn unlike_post(&self, post_id: Uuid, user_id: Uuid) -> Result<Post> {
        let post = self.get_post(post_id).await?;
        likes::ensure_can_unlike(LikeTarget::Post, &post.likes, user_id)?;

        let written = self.store.pull_post_like(post_id, user_id).await?;
        let post = likes::finish(LikeTarget::Post, "unlike", written)?;
        tracing::debug!(post_id = %post_id, user_id = %user_id, "Post unliked");
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryContentStore, MockContentStore};
    use crate::models::NewComment;

    fn service() -> (PostService, Arc<MemoryContentStore>) {
        let store = Arc::new(MemoryContentStore::new());
        (PostService::new(store.clone()), store)
    }

    async fn create(service: &PostService, title: &str) -> Post {
        service
            .add_post(Uuid::new_v4(), Some(title.into()), Some("body".into()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_post_requires_title_and_body() {
        let (service, _) = service();

        let err = service
            .add_post(Uuid::new_v4(), Some("title".into()), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), MISSING_POST_FIELDS);

        let err = service
            .add_post(Uuid::new_v4(), Some(String::new()), Some("body".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_add_post_rejects_long_title_and_duplicates() {
        let (service, _) = service();

        let err = service
            .add_post(Uuid::new_v4(), Some("t".repeat(201)), Some("body".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        create(&service, "taken").await;
        let err = service
            .add_post(Uuid::new_v4(), Some("taken".into()), Some("other".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "Post with this title already exists!");
    }

    #[tokio::test]
    async fn test_update_without_fields_returns_current_post() {
        let (service, _) = service();
        let post = create(&service, "stay").await;

        let same = service
            .update_post(post.id, Some(String::new()), None)
            .await
            .unwrap();
        assert_eq!(same, post);
    }

    #[tokio::test]
    async fn test_update_unknown_post_is_internal() {
        let (service, _) = service();
        let err = service
            .update_post(Uuid::new_v4(), Some("x".into()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_like_twice_fails_and_count_is_unchanged() {
        let (service, _) = service();
        let post = create(&service, "likeable").await;
        let user = Uuid::new_v4();

        let liked = service.like_post(post.id, user).await.unwrap();
        assert_eq!(liked.likes.len(), 1);

        let err = service.like_post(post.id, user).await.unwrap_err();
        assert_eq!(err.to_string(), "You have already liked the post.");
        assert_eq!(service.get_post(post.id).await.unwrap().likes.len(), 1);
    }

    #[tokio::test]
    async fn test_unlike_without_like_fails() {
        let (service, _) = service();
        let post = create(&service, "unliked").await;

        let err = service
            .unlike_post(post.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You have not already liked the post.");
    }

    #[tokio::test]
    async fn test_like_missing_post_is_not_found() {
        let (service, _) = service();
        let err = service
            .like_post(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_post_cascades_to_comments() {
        let (service, store) = service();
        let post = create(&service, "doomed").await;
        let other = create(&service, "survivor").await;

        for (post_id, text) in [(post.id, "a"), (post.id, "b"), (other.id, "c")] {
            store
                .insert_comment(NewComment {
                    post_id,
                    commenter_id: Uuid::new_v4(),
                    comment: text.into(),
                })
                .await
                .unwrap();
        }

        let deleted = service.delete_post(post.id).await.unwrap();
        assert_eq!(deleted.id, post.id);
        assert!(store.list_comments(post.id).await.unwrap().is_empty());
        assert_eq!(store.list_comments(other.id).await.unwrap().len(), 1);

        let err = service.get_post(post.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_post_is_internal() {
        let (service, _) = service();
        let err = service.delete_post(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to delete the post, please try again later."
        );
    }

    #[tokio::test]
    async fn test_total_pages_counts_all_posts() {
        let (service, _) = service();
        assert_eq!(service.total_pages().await.unwrap(), 0);

        for i in 0..11 {
            create(&service, &format!("post {}", i)).await;
        }
        assert_eq!(service.total_pages().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_lost_like_race_is_internal() {
        let post_id = Uuid::new_v4();
        let now = chrono::Utc::now();
        let post = Post {
            id: post_id,
            author_id: Uuid::new_v4(),
            title: "raced".into(),
            body: "body".into(),
            comments: vec![],
            likes: vec![],
            created_at: now,
            updated_at: now,
        };

        let mut store = MockContentStore::new();
        store
            .expect_find_post()
            .returning(move |_| Ok(Some(post.clone())));
        store.expect_push_post_like().returning(|_, _| Ok(None));

        let service = PostService::new(Arc::new(store));
        let err = service.like_post(post_id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
