use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// Rejections produced by the request gates.
///
/// Rendered with the same `{ "success": false, "msg": ... }` body the
/// services use for their own failures.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Internal(String),
}

impl ResponseError for GateError {
    fn status_code(&self) -> StatusCode {
        match self {
            GateError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GateError::Forbidden(_) => StatusCode::FORBIDDEN,
            GateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "msg": self.to_string(),
        }))
    }
}
