//! Route table for `/api/v1`.
//!
//! Every route under `/posts` sits behind the auth and CSRF gates; both let
//! safe methods through, so reads stay public while mutations need a
//! principal and a matching CSRF token.

use crate::db::ContentStore;
use crate::handlers::{self, comments, health, posts};
use crate::services::{CommentService, PostService};
use actix_middleware::{AuthMiddleware, Authenticator, CsrfMiddleware, CsrfVerifier};
use actix_web::web;
use std::sync::Arc;

/// Request gates applied to the posts scope.
#[derive(Clone)]
pub struct Gates {
    pub authenticator: Arc<dyn Authenticator>,
    pub csrf: Arc<dyn CsrfVerifier>,
}

/// Register app data and all `/api/v1` routes.
pub fn configure(cfg: &mut web::ServiceConfig, store: Arc<dyn ContentStore>, gates: Gates) {
    cfg.app_data(web::Data::new(PostService::new(store.clone())))
        .app_data(web::Data::new(CommentService::new(store.clone())))
        .app_data(web::Data::new(store))
        .app_data(handlers::json_config())
        .app_data(handlers::path_config())
        .app_data(handlers::query_config())
        .service(
            web::scope("/api/v1")
                .route("/health", web::get().to(health::health_summary))
                .route("/health/live", web::get().to(health::liveness_check))
                .service(
                    web::scope("/posts")
                        .wrap(CsrfMiddleware::new(gates.csrf))
                        .wrap(AuthMiddleware::new(gates.authenticator).unsafe_methods_only())
                        .service(
                            web::resource("")
                                .route(web::get().to(posts::list_posts))
                                .route(web::post().to(posts::create_post)),
                        )
                        // Must precede `/{post_id}`.
                        .service(
                            web::resource("/getTotalPages")
                                .route(web::get().to(posts::total_pages)),
                        )
                        .service(
                            web::resource("/{post_id}")
                                .route(web::get().to(posts::get_post))
                                .route(web::patch().to(posts::update_post))
                                .route(web::delete().to(posts::delete_post)),
                        )
                        .service(
                            web::resource("/{post_id}/like")
                                .route(web::patch().to(posts::like_post)),
                        )
                        .service(
                            web::resource("/{post_id}/unlike")
                                .route(web::patch().to(posts::unlike_post)),
                        )
                        .service(
                            web::resource("/{post_id}/comments")
                                .route(web::get().to(comments::list_comments))
                                .route(web::post().to(comments::create_comment)),
                        )
                        .service(
                            web::resource("/{post_id}/comments/{comment_id}")
                                .route(web::get().to(comments::get_comment))
                                .route(web::patch().to(comments::update_comment))
                                .route(web::delete().to(comments::delete_comment)),
                        )
                        .service(
                            web::resource("/{post_id}/comments/{comment_id}/like")
                                .route(web::patch().to(comments::like_comment)),
                        )
                        .service(
                            web::resource("/{post_id}/comments/{comment_id}/unlike")
                                .route(web::patch().to(comments::unlike_comment)),
                        ),
                ),
        );
}
