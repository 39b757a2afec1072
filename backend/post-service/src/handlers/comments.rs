/// Comment handlers - HTTP endpoints for comments nested under a post
use super::posts::LikeRequest;
use super::{acting_user, UserRef};
use crate::error::Result;
use crate::services::CommentService;
use actix_middleware::UserId;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub comment: Option<String>,
    pub user: Option<UserRef>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub comment: Option<String>,
}

pub async fn list_comments(
    service: web::Data<CommentService>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comments = service.list_post_comments(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "comments": comments })))
}

pub async fn get_comment(
    service: web::Data<CommentService>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = service.get_comment(post_id, comment_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "comment": comment })))
}

/// Add a comment and attach it to the post
pub async fn create_comment(
    service: web::Data<CommentService>,
    user_id: UserId,
    post_id: web::Path<Uuid>,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let commenter_id = acting_user(user_id, req.user.as_ref())?;

    let (post, comment) = service
        .add_post_comment(post_id.into_inner(), commenter_id, req.comment)
        .await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "updatedPost": post,
        "newComment": comment,
    })))
}

pub async fn update_comment(
    service: web::Data<CommentService>,
    _user_id: UserId,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = service
        .update_post_comment(post_id, comment_id, req.into_inner().comment)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "updatedComment": comment,
    })))
}

/// Delete a comment and detach it from the post
pub async fn delete_comment(
    service: web::Data<CommentService>,
    _user_id: UserId,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let (post, comment) = service.delete_post_comment(post_id, comment_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "updatedPost": post,
        "deletedComment": comment,
    })))
}

pub async fn like_comment(
    service: web::Data<CommentService>,
    user_id: UserId,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let req = LikeRequest::from_body(&body)?;
    let user_id = acting_user(user_id, req.user.as_ref())?;

    let comment = service.like_comment(post_id, comment_id, user_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "updatedComment": comment,
    })))
}

pub async fn unlike_comment(
    service: web::Data<CommentService>,
    user_id: UserId,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let req = LikeRequest::from_body(&body)?;
    let user_id = acting_user(user_id, req.user.as_ref())?;

    let comment = service.unlike_comment(post_id, comment_id, user_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "updatedComment": comment,
    })))
}
