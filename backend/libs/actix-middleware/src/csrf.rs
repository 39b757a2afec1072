//! CSRF protection for state-changing requests
//!
//! Tokens are bound to the authenticated principal: the expected value of the
//! `X-CSRF-Token` header is `hex(HMAC-SHA256(secret, user_id))`. The gate must
//! run after [`AuthMiddleware`](crate::AuthMiddleware) so the principal is
//! available in the request extensions.

use crate::auth::UserId;
use crate::error::GateError;
use crate::GateScope;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::HeaderMap,
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::rc::Rc;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

pub const CSRF_HEADER: &str = "x-csrf-token";

/// Checks the CSRF token presented with a request.
pub trait CsrfVerifier: Send + Sync {
    fn verify(&self, headers: &HeaderMap, user: UserId) -> Result<(), GateError>;
}

#[derive(Clone)]
pub struct HmacCsrfVerifier {
    secret: Vec<u8>,
}

impl HmacCsrfVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn mac_for(&self, user: UserId) -> Result<HmacSha256, GateError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| GateError::Internal(format!("Invalid CSRF key: {}", e)))?;
        mac.update(user.0.as_bytes());
        Ok(mac)
    }

    /// Token a client must echo back in `X-CSRF-Token`.
    pub fn issue_token(&self, user: UserId) -> Result<String, GateError> {
        let mac = self.mac_for(user)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl CsrfVerifier for HmacCsrfVerifier {
    fn verify(&self, headers: &HeaderMap, user: UserId) -> Result<(), GateError> {
        let presented = headers
            .get(CSRF_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| GateError::Forbidden("Missing CSRF token".to_string()))?;

        let signature = hex::decode(presented.trim())
            .map_err(|_| GateError::Forbidden("Invalid CSRF token".to_string()))?;

        self.mac_for(user)?
            .verify_slice(&signature)
            .map_err(|_| GateError::Forbidden("Invalid CSRF token".to_string()))
    }
}

/// CSRF gate; only state-changing methods are checked.
#[derive(Clone)]
pub struct CsrfMiddleware {
    verifier: Arc<dyn CsrfVerifier>,
}

impl CsrfMiddleware {
    pub fn new(verifier: Arc<dyn CsrfVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CsrfMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CsrfMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
        }))
    }
}

pub struct CsrfMiddlewareService<S> {
    service: Rc<S>,
    verifier: Arc<dyn CsrfVerifier>,
}

impl<S, B> Service<ServiceRequest> for CsrfMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        let outcome = if GateScope::UnsafeMethods.applies_to(req.method()) {
            let principal = req.extensions().get::<UserId>().copied();
            match principal {
                Some(user) => self.verifier.verify(req.headers(), user),
                None => Err(GateError::Unauthorized(
                    "User not authenticated".to_string(),
                )),
            }
        } else {
            Ok(())
        };

        Box::pin(async move {
            if let Err(err) = outcome {
                tracing::warn!(path = %req.path(), error = %err, "CSRF check rejected request");
                return Ok(req.error_response(err).map_into_right_body());
            }

            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}
