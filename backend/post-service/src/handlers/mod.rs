/// HTTP handlers for post-service
///
/// Handlers translate requests into service calls and wrap results in the
/// `{ "success": true, ... }` envelope. Extraction failures (bad JSON, bad
/// path ids, bad query strings) use the same `{success:false,msg}` shape as
/// service errors.
use crate::error::{AppError, Result};
use actix_middleware::UserId;
use actix_web::web;
use serde::Deserialize;
use uuid::Uuid;

pub mod comments;
pub mod health;
pub mod posts;

/// `{"userID": ...}` as sent by clients in request bodies.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    #[serde(rename = "userID")]
    pub user_id: Option<Uuid>,
}

/// The acting user is always the authenticated principal. A user named in
/// the body must match it.
pub fn acting_user(principal: UserId, claimed: Option<&UserRef>) -> Result<Uuid> {
    match claimed.and_then(|user| user.user_id) {
        Some(user_id) if user_id != principal.0 => Err(AppError::Forbidden(
            "You cannot act on behalf of another user.".to_string(),
        )),
        _ => Ok(principal.0),
    }
}

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid request body: {}", err)).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "Rejected malformed path id");
        AppError::BadRequest("Invalid id in request path.".to_string()).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid query string: {}", err)).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acting_user_defaults_to_principal() {
        let principal = UserId(Uuid::new_v4());
        assert_eq!(acting_user(principal, None).unwrap(), principal.0);

        let empty = UserRef { user_id: None };
        assert_eq!(acting_user(principal, Some(&empty)).unwrap(), principal.0);
    }

    #[test]
    fn test_acting_user_rejects_impersonation() {
        let principal = UserId(Uuid::new_v4());

        let same = UserRef {
            user_id: Some(principal.0),
        };
        assert!(acting_user(principal, Some(&same)).is_ok());

        let other = UserRef {
            user_id: Some(Uuid::new_v4()),
        };
        assert!(matches!(
            acting_user(principal, Some(&other)),
            Err(AppError::Forbidden(_))
        ));
    }
}
