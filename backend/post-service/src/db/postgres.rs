//! PostgreSQL-backed [`ContentStore`].

use super::ContentStore;
use crate::error::Result;
use crate::models::{Comment, CommentChanges, Like, NewComment, NewPost, Post, PostChanges, PostQuery};
use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const POST_COLUMNS: &str =
    "id, author_id, title, body, comment_ids, likes, created_at, updated_at";
const COMMENT_COLUMNS: &str =
    "id, post_id, commenter_id, comment, likes, created_at, updated_at";

#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        MIGRATOR.run(&self.pool).await
    }
}

/// Escape `LIKE` metacharacters so user search text matches literally.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// JSONB containment probe matching any like by `user_id`.
fn like_probe(user_id: Uuid) -> Json<serde_json::Value> {
    Json(serde_json::json!([{ "userID": user_id }]))
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM posts WHERE TRUE", POST_COLUMNS));

        if let Some(author_id) = query.author_id {
            builder.push(" AND author_id = ").push_bind(author_id);
        }

        if let Some(search) = &query.search {
            let pattern = format!("%{}%", escape_like(search));
            builder
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR body ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        let direction = if query.sort.descending { "DESC" } else { "ASC" };
        builder.push(format!(
            " ORDER BY {} {dir}, seq {dir}",
            query.sort.field.column(),
            dir = direction
        ));
        builder
            .push(" LIMIT ")
            .push_bind(query.limit())
            .push(" OFFSET ")
            .push_bind(query.offset());

        let posts = builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn count_posts(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts WHERE id = $1",
            POST_COLUMNS
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn insert_post(&self, post: NewPost) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (id, author_id, title, body)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(post.author_id)
        .bind(&post.title)
        .bind(&post.body)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn update_post(&self, post_id: Uuid, changes: PostChanges) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                body = COALESCE($3, body),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(post_id)
        .bind(changes.title)
        .bind(changes.body)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "DELETE FROM posts WHERE id = $1 RETURNING {}",
            POST_COLUMNS
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn push_post_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET comment_ids = array_append(comment_ids, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(post_id)
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn pull_post_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET comment_ids = array_remove(comment_ids, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(post_id)
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn push_post_like(&self, post_id: Uuid, like: Like) -> Result<Option<Post>> {
        let user_id = like.user_id;
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET likes = likes || $2, updated_at = NOW()
            WHERE id = $1 AND NOT likes @> $3
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(post_id)
        .bind(Json(vec![like]))
        .bind(like_probe(user_id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn pull_post_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET likes = COALESCE(
                    (SELECT jsonb_agg(l) FROM jsonb_array_elements(likes) AS l
                     WHERE l->>'userID' <> $2),
                    '[]'::jsonb),
                updated_at = NOW()
            WHERE id = $1 AND likes @> $3
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(post_id)
        .bind(user_id.to_string())
        .bind(like_probe(user_id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {}
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at DESC, seq DESC
            "#,
            COMMENT_COLUMNS
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn find_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments WHERE id = $1 AND post_id = $2",
            COMMENT_COLUMNS
        ))
        .bind(comment_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (id, post_id, commenter_id, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            COMMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(comment.post_id)
        .bind(comment.commenter_id)
        .bind(&comment.comment)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn update_comment(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        changes: CommentChanges,
    ) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            UPDATE comments
            SET comment = $3, updated_at = NOW()
            WHERE id = $1 AND post_id = $2
            RETURNING {}
            "#,
            COMMENT_COLUMNS
        ))
        .bind(comment_id)
        .bind(post_id)
        .bind(&changes.comment)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, post_id: Uuid, comment_id: Uuid) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "DELETE FROM comments WHERE id = $1 AND post_id = $2 RETURNING {}",
            COMMENT_COLUMNS
        ))
        .bind(comment_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete_post_comments(&self, post_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn push_comment_like(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        like: Like,
    ) -> Result<Option<Comment>> {
        let user_id = like.user_id;
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            UPDATE comments
            SET likes = likes || $3, updated_at = NOW()
            WHERE id = $1 AND post_id = $2 AND NOT likes @> $4
            RETURNING {}
            "#,
            COMMENT_COLUMNS
        ))
        .bind(comment_id)
        .bind(post_id)
        .bind(Json(vec![like]))
        .bind(like_probe(user_id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn pull_comment_like(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            UPDATE comments
            SET likes = COALESCE(
                    (SELECT jsonb_agg(l) FROM jsonb_array_elements(likes) AS l
                     WHERE l->>'userID' <> $3),
                    '[]'::jsonb),
                updated_at = NOW()
            WHERE id = $1 AND post_id = $2 AND likes @> $4
            RETURNING {}
            "#,
            COMMENT_COLUMNS
        ))
        .bind(comment_id)
        .bind(post_id)
        .bind(user_id.to_string())
        .bind(like_probe(user_id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_metacharacters() {
        assert_eq!(escape_like("hello"), "hello");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }

    #[test]
    fn test_like_probe_uses_wire_field_name() {
        let user = Uuid::new_v4();
        let Json(probe) = like_probe(user);
        assert_eq!(probe[0]["userID"], user.to_string());
    }
}
