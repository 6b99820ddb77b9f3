//! Bearer-token authentication and role gates.
//!
//! Login: reuse the identity token already in the request context, otherwise
//! verify `Authorization: Bearer <jwt>` with the injected [`TokenVerifier`].
//! A verified token is stored in the request extensions and its uid is echoed
//! in `X-Logged-User-Id` on both the request and the response.
//!
//! Access modes:
//! - `Anonymous`: login is attempted, failures are ignored
//! - `LoggedUser`: login failure -> 401 `{"error": ...}`
//! - `Role` / `AnyRole`: login failure -> 401, missing role -> 403 `{"message": ...}`

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

use crate::context::ContextError;
use crate::middleware::context_logger::{ContextLogger, DEFAULT_LEVEL};
use crate::services::auth::{IdentityToken, TokenVerifier, VerifyError};

pub const LOGGED_USER_ID_HEADER: HeaderName = HeaderName::from_static("x-logged-user-id");
pub const BEARER_PREFIX: &str = "Bearer ";

const FORBIDDEN_MESSAGE: &str = "You have no permission to do this operation";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(
        "please, provide an Authorization header with the 'Bearer ' prefix followed by the JWT, as 'Bearer <jwt>'"
    )]
    MissingCredential,

    #[error(transparent)]
    Verification(#[from] VerifyError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("You have no permission to do this operation")]
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({ "message": FORBIDDEN_MESSAGE })),
            )
                .into_response(),
            err => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response(),
        }
    }
}

/// What a gate requires from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Anonymous,
    LoggedUser,
    Role(String),
    AnyRole(Vec<String>),
}

impl Access {
    fn permits(&self, token: &IdentityToken) -> bool {
        match self {
            Access::Anonymous | Access::LoggedUser => true,
            Access::Role(role) => token.has_role(role),
            Access::AnyRole(roles) => token.has_any_role(roles.as_slice()),
        }
    }
}

/// Composes auth gates over routers. Cheap to clone; share one per process.
#[derive(Clone)]
pub struct AuthMiddleware {
    verifier: Arc<dyn TokenVerifier>,
    log_level: LevelFilter,
}

impl std::fmt::Debug for AuthMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthMiddleware").finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct Gate {
    auth: AuthMiddleware,
    access: Arc<Access>,
}

impl AuthMiddleware {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            verifier,
            log_level: DEFAULT_LEVEL,
        }
    }

    /// Level used for gate logs when no context logger is installed yet.
    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    /// Parse the token when present; never blocks the request.
    pub fn allow_anonymous<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.apply(router, Access::Anonymous)
    }

    pub fn logged_user<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.apply(router, Access::LoggedUser)
    }

    pub fn with_role<S>(&self, router: Router<S>, role: impl Into<String>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.apply(router, Access::Role(role.into()))
    }

    pub fn with_any<S, I, R>(&self, router: Router<S>, roles: I) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.apply(
            router,
            Access::AnyRole(roles.into_iter().map(Into::into).collect()),
        )
    }

    pub fn apply<S>(&self, router: Router<S>, access: Access) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let gate = Gate {
            auth: self.clone(),
            access: Arc::new(access),
        };
        router.layer(middleware::from_fn_with_state(gate, gate_middleware))
    }

    /// Shared login step of every gate.
    ///
    /// `X-Logged-User-Id` on the request only ever carries a verified uid:
    /// whatever the client sent is dropped before verification.
    pub async fn login(&self, req: &mut Request) -> Result<IdentityToken, AuthError> {
        req.headers_mut().remove(LOGGED_USER_ID_HEADER);

        let cached = req.extensions().get::<IdentityToken>().cloned();
        let token = match cached {
            Some(token) => token,
            None => {
                let bearer = bearer_token(req.headers())?.to_owned();
                let token = self.verifier.verify(&bearer).await?;
                req.extensions_mut().insert(token.clone());
                token
            }
        };

        if let Ok(value) = HeaderValue::from_str(&token.uid) {
            req.headers_mut().insert(LOGGED_USER_ID_HEADER, value);
        }

        Ok(token)
    }

    fn logger(&self, req: &Request) -> ContextLogger {
        ContextLogger::current_or(req.extensions(), req.headers(), self.log_level)
    }
}

/// Token after the case-sensitive `Bearer ` prefix.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .ok_or(AuthError::MissingCredential)
}

async fn gate_middleware(State(gate): State<Gate>, mut req: Request, next: Next) -> Response {
    let token = match gate.auth.login(&mut req).await {
        Ok(token) => token,
        // Not logged here; an inner blocking gate reports the failure once.
        Err(_) if *gate.access == Access::Anonymous => return next.run(req).await,
        Err(err) => {
            gate.auth
                .logger(&req)
                .warn(format_args!("authentication failed: {err}"));
            return err.into_response();
        }
    };

    if !gate.access.permits(&token) {
        gate.auth
            .logger(&req)
            .warn(format_args!("authorization denied for {}", token.uid));
        return AuthError::Forbidden.into_response();
    }

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&token.uid) {
        res.headers_mut().insert(LOGGED_USER_ID_HEADER, value);
    }
    res
}
