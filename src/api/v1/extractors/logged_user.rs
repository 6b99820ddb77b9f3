/*
 * Responsibility
 * - Hand the verified IdentityToken to handlers
 * - Assumes an auth gate stored it in request.extensions(); 401 otherwise
 * - Option<LoggedUser> for routes behind allow_anonymous
 */
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};

use crate::{context, middleware::auth::AuthError, services::auth::IdentityToken};

#[derive(Debug, Clone)]
pub struct LoggedUser(pub IdentityToken);

impl<S> FromRequestParts<S> for LoggedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = context::identity_token(&parts.extensions)?;
        Ok(Self(token.clone()))
    }
}

impl<S> OptionalFromRequestParts<S> for LoggedUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(context::identity_token(&parts.extensions)
            .ok()
            .cloned()
            .map(Self))
    }
}
