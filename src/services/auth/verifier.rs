use async_trait::async_trait;
use thiserror::Error;

use super::IdentityToken;

/// Errors returned by a [`TokenVerifier`].
///
/// The message is surfaced to the client as the `error` field of a 401.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("token has no subject ('sub') claim")]
    MissingSubject,

    #[error("identity provider rejected the token: {0}")]
    Rejected(String),
}

/// Capability that validates a bearer credential against an identity provider.
///
/// Implementations are shared across concurrent requests, so they must be
/// `Send + Sync`. Dropping the returned future cancels the verification.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<IdentityToken, VerifyError>;
}
