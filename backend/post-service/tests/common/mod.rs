//! Shared fixtures for the HTTP tests: a signed-in caller and an app wired
//! to a fresh in-memory store.
#![allow(dead_code, unused_macros)]

use actix_middleware::{HmacCsrfVerifier, JwtAuthenticator, UserId, CSRF_HEADER};
use actix_web::test;
use uuid::Uuid;

pub const JWT_SECRET: &[u8] = b"post-service-test-jwt-secret-0123456789abc";
pub const CSRF_SECRET: &str = "post-service-test-csrf-secret";

pub struct Caller {
    pub id: Uuid,
    pub bearer: String,
    pub csrf: String,
}

impl Caller {
    pub fn new() -> Self {
        let id = Uuid::new_v4();
        let token = JwtAuthenticator::new(JWT_SECRET)
            .issue_token(id, 600)
            .unwrap();
        let csrf = HmacCsrfVerifier::new(CSRF_SECRET)
            .issue_token(UserId(id))
            .unwrap();
        Self {
            id,
            bearer: format!("Bearer {}", token),
            csrf,
        }
    }

    pub fn sign(&self, req: test::TestRequest) -> test::TestRequest {
        req.insert_header(("Authorization", self.bearer.clone()))
            .insert_header((CSRF_HEADER, self.csrf.clone()))
    }
}

macro_rules! app {
    () => {{
        let store: std::sync::Arc<dyn post_service::db::ContentStore> =
            std::sync::Arc::new(post_service::db::MemoryContentStore::new());
        let gates = post_service::routes::Gates {
            authenticator: std::sync::Arc::new(actix_middleware::JwtAuthenticator::new(
                common::JWT_SECRET,
            )),
            csrf: std::sync::Arc::new(actix_middleware::HmacCsrfVerifier::new(common::CSRF_SECRET)),
        };
        actix_web::test::init_service(actix_web::App::new().configure(move |cfg| {
            post_service::routes::configure(cfg, store, gates)
        }))
        .await
    }};
}

macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        (status, body)
    }};
}
