/// Post handlers - HTTP endpoints for post operations
use super::{acting_user, UserRef};
use crate::error::{AppError, Result};
use crate::models::PostQuery;
use crate::services::PostService;
use actix_middleware::UserId;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "userID")]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub user: Option<UserRef>,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LikeRequest {
    pub user: Option<UserRef>,
}

impl LikeRequest {
    /// Like/unlike bodies are optional. An empty body is no claim; anything
    /// else must be a valid `LikeRequest`.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))
    }
}

/// List posts with paging, sorting, search and author filter
pub async fn list_posts(
    service: web::Data<PostService>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse> {
    let query = PostQuery::parse(
        query.page.as_deref(),
        query.sort_by.as_deref(),
        query.search.as_deref(),
        query.user_id.as_deref(),
    )?;

    let posts = service.list_posts(&query).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "posts": posts })))
}

pub async fn total_pages(service: web::Data<PostService>) -> Result<HttpResponse> {
    let total_pages = service.total_pages().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "totalPages": total_pages,
    })))
}

/// Get a post by ID
pub async fn get_post(
    service: web::Data<PostService>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = service.get_post(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "post": post })))
}

/// Create a new post authored by the caller
pub async fn create_post(
    service: web::Data<PostService>,
    user_id: UserId,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let author_id = acting_user(user_id, req.user.as_ref())?;

    let post = service.add_post(author_id, req.title, req.body).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "success": true, "newPost": post })))
}

pub async fn update_post(
    service: web::Data<PostService>,
    _user_id: UserId,
    post_id: web::Path<Uuid>,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let post = service
        .update_post(post_id.into_inner(), req.title, req.body)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "updatedPost": post })))
}

/// Delete a post and all of its comments
pub async fn delete_post(
    service: web::Data<PostService>,
    _user_id: UserId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = service.delete_post(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "deletedPost": post })))
}

pub async fn like_post(
    service: web::Data<PostService>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let req = LikeRequest::from_body(&body)?;
    let user_id = acting_user(user_id, req.user.as_ref())?;

    let post = service.like_post(post_id.into_inner(), user_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "updatedPost": post })))
}

pub async fn unlike_post(
    service: web::Data<PostService>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let req = LikeRequest::from_body(&body)?;
    let user_id = acting_user(user_id, req.user.as_ref())?;

    let post = service.unlike_post(post_id.into_inner(), user_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "updatedPost": post })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_body_may_be_empty() {
        assert!(LikeRequest::from_body(b"").unwrap().user.is_none());
        assert!(LikeRequest::from_body(b" \n").unwrap().user.is_none());
        assert!(LikeRequest::from_body(b"{}").unwrap().user.is_none());
    }

    #[test]
    fn test_malformed_like_body_is_rejected() {
        let bodies: [&[u8]; 3] = [
            br#"{"user":{"userID":"not-a-uuid"}}"#,
            b"not json",
            b"[]",
        ];
        for body in bodies {
            assert!(matches!(
                LikeRequest::from_body(body),
                Err(AppError::BadRequest(_))
            ));
        }
    }
}
