//! Typed access to the per-request context.
//!
//! The request context is the request's `http::Extensions`. Middleware
//! inserts at most one [`IdentityToken`], one [`ContextLogger`] and one
//! `PgPool`; readers get a [`ContextError`] instead of a panic when
//! something was never installed.

use axum::http::{Extensions, HeaderMap, HeaderName};
use sqlx::PgPool;
use thiserror::Error;
use tower_http::request_id::RequestId;

use crate::middleware::context_logger::ContextLogger;
use crate::services::auth::IdentityToken;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("identity token not found in request context")]
    MissingIdentity,
    #[error("contextual logger not found in request context")]
    MissingLogger,
    #[error(
        "unable to obtain the database from the request context, install the database middleware first"
    )]
    MissingDatabase,
}

pub fn identity_token(extensions: &Extensions) -> Result<&IdentityToken, ContextError> {
    extensions
        .get::<IdentityToken>()
        .ok_or(ContextError::MissingIdentity)
}

pub fn logger(extensions: &Extensions) -> Result<&ContextLogger, ContextError> {
    extensions
        .get::<ContextLogger>()
        .ok_or(ContextError::MissingLogger)
}

pub fn database(extensions: &Extensions) -> Result<&PgPool, ContextError> {
    extensions
        .get::<PgPool>()
        .ok_or(ContextError::MissingDatabase)
}

/// True if the request carries a verified token granting `role`.
pub fn logged_user_is(extensions: &Extensions, role: &str) -> bool {
    identity_token(extensions).is_ok_and(|token| token.has_role(role))
}

/// True if the request carries a verified token granting at least one of `roles`.
pub fn logged_user_is_any<R: AsRef<str>>(extensions: &Extensions, roles: &[R]) -> bool {
    identity_token(extensions).is_ok_and(|token| token.has_any_role(roles))
}

/// Request id set by `SetRequestIdLayer`, falling back to the raw header.
pub fn request_id(extensions: &Extensions, headers: &HeaderMap) -> String {
    extensions
        .get::<RequestId>()
        .map(RequestId::header_value)
        .or_else(|| headers.get(REQUEST_ID_HEADER))
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
