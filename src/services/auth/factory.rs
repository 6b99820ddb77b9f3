/// Factory: build the token verifier from application `Config`.
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::services::auth::{JwtVerifier, TokenVerifier, VerifyError};

pub fn build_verifier(config: &AuthConfig) -> Result<Arc<dyn TokenVerifier>, VerifyError> {
    let verifier = JwtVerifier::new(config)?;

    tracing::info!(
        issuer = %config.issuer,
        audience = %config.audience,
        algorithm = ?config.algorithm,
        "token verifier ready"
    );

    Ok(Arc::new(verifier))
}
