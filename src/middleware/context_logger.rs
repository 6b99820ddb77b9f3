//! Per-request contextual logger.
//!
//! Installs a [`ContextLogger`] in the request extensions, annotated with the
//! request id and the logged user id (`anonymous` when no identity token was
//! attached upstream). The verbosity can be raised or lowered per request with
//! the `X-Log-Level` header; unrecognized values fall back to the configured
//! default without rejecting the request.
//!
//! The rest of the chain runs inside the logger's span, so plain `tracing`
//! events emitted by handlers carry the same ids.

use std::convert::Infallible;
use std::fmt::Display;

use axum::{
    Router,
    extract::{FromRequestParts, Request, State},
    http::{Extensions, HeaderMap, HeaderName, request::Parts},
    middleware::{self, Next},
    response::Response,
};
use tracing::{Instrument, Level, Span};
use tracing_subscriber::filter::LevelFilter;

use crate::context;

pub const LOG_LEVEL_HEADER: HeaderName = HeaderName::from_static("x-log-level");
pub const LOG_TARGET: &str = "maryread::request";
pub const ANONYMOUS_USER_ID: &str = "anonymous";
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::DEBUG;

#[derive(Debug, Clone)]
pub struct ContextLogger {
    span: Span,
    request_id: String,
    user_id: String,
    level: LevelFilter,
}

impl ContextLogger {
    pub fn new(request_id: impl Into<String>, user_id: impl Into<String>, level: LevelFilter) -> Self {
        let request_id = request_id.into();
        let user_id = user_id.into();
        let span = tracing::info_span!(
            target: LOG_TARGET,
            "request",
            request_id = %request_id,
            user_id = %user_id
        );

        Self {
            span,
            request_id,
            user_id,
            level,
        }
    }

    pub fn anonymous(request_id: impl Into<String>, level: LevelFilter) -> Self {
        Self::new(request_id, ANONYMOUS_USER_ID, level)
    }

    /// Logger installed by the middleware, or an anonymous one at [`DEFAULT_LEVEL`].
    pub fn current(extensions: &Extensions, headers: &HeaderMap) -> Self {
        Self::current_or(extensions, headers, DEFAULT_LEVEL)
    }

    /// Like [`ContextLogger::current`]; the fallback logger still honours
    /// `X-Log-Level` and otherwise uses `default_level`.
    pub fn current_or(extensions: &Extensions, headers: &HeaderMap, default_level: LevelFilter) -> Self {
        match context::logger(extensions) {
            Ok(logger) => logger.clone(),
            Err(_) => {
                let level = level_from_headers(headers).unwrap_or(default_level);
                Self::anonymous(context::request_id(extensions, headers), level)
            }
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    pub fn error(&self, message: impl Display) {
        if self.enabled(Level::ERROR) {
            tracing::error!(target: LOG_TARGET, parent: &self.span, "{message}");
        }
    }

    pub fn warn(&self, message: impl Display) {
        if self.enabled(Level::WARN) {
            tracing::warn!(target: LOG_TARGET, parent: &self.span, "{message}");
        }
    }

    pub fn info(&self, message: impl Display) {
        if self.enabled(Level::INFO) {
            tracing::info!(target: LOG_TARGET, parent: &self.span, "{message}");
        }
    }

    pub fn debug(&self, message: impl Display) {
        if self.enabled(Level::DEBUG) {
            tracing::debug!(target: LOG_TARGET, parent: &self.span, "{message}");
        }
    }

    pub fn trace(&self, message: impl Display) {
        if self.enabled(Level::TRACE) {
            tracing::trace!(target: LOG_TARGET, parent: &self.span, "{message}");
        }
    }
}

impl<S> FromRequestParts<S> for ContextLogger
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::current(&parts.extensions, &parts.headers))
    }
}

pub fn apply<S>(router: Router<S>, default_level: LevelFilter) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(
        default_level,
        context_logger_middleware,
    ))
}

async fn context_logger_middleware(
    State(default_level): State<LevelFilter>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_id = context::request_id(req.extensions(), req.headers());
    let user_id = context::identity_token(req.extensions())
        .map(|token| token.uid.clone())
        .unwrap_or_else(|_| ANONYMOUS_USER_ID.to_string());
    let level = level_from_headers(req.headers()).unwrap_or(default_level);

    let logger = ContextLogger::new(request_id, user_id, level);
    let span = logger.span().clone();
    req.extensions_mut().insert(logger);

    next.run(req).instrument(span).await
}

/// Level names (`off`, `error` .. `trace`, any case) or their numeric form `0`-`5`.
pub fn level_from_headers(headers: &HeaderMap) -> Option<LevelFilter> {
    let raw = headers.get(LOG_LEVEL_HEADER)?.to_str().ok()?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse().ok()
}
