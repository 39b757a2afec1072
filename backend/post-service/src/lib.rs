//! Post Service Library
//!
//! Posts, comments and likes behind a JSON REST API:
//! - paginated, searchable post listings
//! - post deletion cascading to comments
//! - idempotent like/unlike on posts and comments
//! - comment creation with a compensating delete when the parent post
//!   cannot be updated
//!
//! Storage is pluggable through [`db::ContentStore`] (PostgreSQL or
//! in-memory).

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
