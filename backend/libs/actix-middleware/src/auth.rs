use crate::error::GateError;
use crate::GateScope;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::HeaderMap,
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated principal stored in request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

/// Resolves the caller of a request.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Result<UserId, GateError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

/// HS256 bearer-token authenticator.
#[derive(Clone)]
pub struct JwtAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Sign a token for `user_id` that expires `ttl_secs` from now.
    pub fn issue_token(&self, user_id: Uuid, ttl_secs: i64) -> Result<String, GateError> {
        let exp = (chrono::Utc::now().timestamp() + ttl_secs).max(0) as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| GateError::Internal(format!("Failed to sign token: {}", e)))
    }
}

impl Authenticator for JwtAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<UserId, GateError> {
        let auth_header = headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| GateError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            GateError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        let token_data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::warn!("JWT validation failed: {}", e);
            GateError::Unauthorized("Invalid or expired token".to_string())
        })?;

        let user_id = Uuid::parse_str(&token_data.claims.sub).map_err(|e| {
            tracing::error!("Invalid user_id UUID in token: {}", e);
            GateError::Unauthorized("Invalid token: malformed user_id".to_string())
        })?;

        Ok(UserId(user_id))
    }
}

/// Authentication gate.
///
/// On success the caller's [`UserId`] is inserted into the request extensions.
#[derive(Clone)]
pub struct AuthMiddleware {
    authenticator: Arc<dyn Authenticator>,
    scope: GateScope,
}

impl AuthMiddleware {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            authenticator,
            scope: GateScope::AllMethods,
        }
    }

    /// Let GET/HEAD/OPTIONS through without a principal.
    pub fn unsafe_methods_only(mut self) -> Self {
        self.scope = GateScope::UnsafeMethods;
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            authenticator: self.authenticator.clone(),
            scope: self.scope,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    authenticator: Arc<dyn Authenticator>,
    scope: GateScope,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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
        let outcome = self
            .scope
            .applies_to(req.method())
            .then(|| self.authenticator.authenticate(req.headers()));

        Box::pin(async move {
            match outcome {
                Some(Ok(user_id)) => {
                    req.extensions_mut().insert(user_id);
                }
                Some(Err(err)) => {
                    return Ok(req.error_response(err).map_into_right_body());
                }
                None => {}
            }

            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

impl actix_web::FromRequest for UserId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<UserId>() {
            Some(user_id) => ready(Ok(*user_id)),
            None => ready(Err(
                GateError::Unauthorized("User not authenticated".to_string()).into()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderValue, AUTHORIZATION};

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_issued_token_round_trips_to_principal() {
        let auth = JwtAuthenticator::new(b"an-hs256-secret-of-reasonable-length!!");
        let user = Uuid::new_v4();
        let token = auth.issue_token(user, 3600).unwrap();

        let principal = auth
            .authenticate(&headers_with(&format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(principal, UserId(user));
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let auth = JwtAuthenticator::new(b"secret");
        let err = auth.authenticate(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, GateError::Unauthorized(_)));
    }

    #[test]
    fn test_wrong_scheme_is_rejected() {
        let auth = JwtAuthenticator::new(b"secret");
        let err = auth.authenticate(&headers_with("Basic abc")).unwrap_err();
        assert!(matches!(err, GateError::Unauthorized(_)));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = JwtAuthenticator::new(b"issuer-secret");
        let verifier = JwtAuthenticator::new(b"verifier-secret");
        let token = issuer.issue_token(Uuid::new_v4(), 3600).unwrap();

        assert!(verifier
            .authenticate(&headers_with(&format!("Bearer {}", token)))
            .is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let auth = JwtAuthenticator::new(b"secret");
        let token = auth.issue_token(Uuid::new_v4(), -3600).unwrap();

        assert!(auth
            .authenticate(&headers_with(&format!("Bearer {}", token)))
            .is_err());
    }
}
