//! # Actix Middleware Library
//!
//! Request gates and observability middleware shared by the Nova Actix services.
//!
//! ## Modules
//! - `auth`: principal extraction (`Authenticator`, JWT implementation, `AuthMiddleware`)
//! - `csrf`: CSRF token verification for state-changing requests
//! - `correlation_id`: X-Correlation-ID propagation
//! - `logging`: request/response logging through `tracing`
//! - `metrics`: Prometheus request counters and latency histograms

pub mod auth;
pub mod correlation_id;
pub mod csrf;
pub mod error;
pub mod logging;
pub mod metrics;

pub use auth::{AuthMiddleware, Authenticator, JwtAuthenticator, UserId};
pub use correlation_id::{CorrelationId, CorrelationIdMiddleware};
pub use csrf::{CsrfMiddleware, CsrfVerifier, HmacCsrfVerifier, CSRF_HEADER};
pub use error::GateError;
pub use logging::Logging;
pub use metrics::MetricsMiddleware;

use actix_web::http::Method;

/// Which requests a gate applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateScope {
    /// Every request passes through the gate.
    AllMethods,
    /// Only state-changing requests (anything but GET/HEAD/OPTIONS/TRACE).
    UnsafeMethods,
}

impl GateScope {
    pub fn applies_to(&self, method: &Method) -> bool {
        match self {
            GateScope::AllMethods => true,
            GateScope::UnsafeMethods => !is_safe_method(method),
        }
    }
}

/// RFC 9110 safe methods.
pub fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}
