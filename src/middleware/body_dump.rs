//! Request/response body dump, enabled per request with the `X-Body-Dump` header.
//!
//! Both bodies are buffered, forwarded unchanged, and logged at `debug` level
//! through the request's [`ContextLogger`]. JSON object bodies are re-encoded
//! compactly; anything else is logged as the raw string.

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use tracing::Level;

use super::context_logger::{ContextLogger, LOG_TARGET};

pub const BODY_DUMP_HEADER: HeaderName = HeaderName::from_static("x-body-dump");

/// `limit` bounds the buffered request body.
pub fn apply<S>(router: Router<S>, limit: usize) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(limit, body_dump_middleware))
}

async fn body_dump_middleware(State(limit): State<usize>, req: Request, next: Next) -> Response {
    if !req.headers().contains_key(BODY_DUMP_HEADER) {
        return next.run(req).await;
    }

    let logger = ContextLogger::current(req.extensions(), req.headers());

    let (parts, body) = req.into_parts();
    let request_body = match to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(err) => {
            logger.warn(format_args!("unable to buffer request body: {err}"));
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let res = next
        .run(Request::from_parts(parts, Body::from(request_body.clone())))
        .await;

    let (parts, body) = res.into_parts();
    let response_body = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            logger.error(format_args!("unable to buffer response body: {err}"));
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if logger.enabled(Level::DEBUG) {
        tracing::debug!(
            target: LOG_TARGET,
            parent: logger.span(),
            request_body = %clean_stringify_body(&request_body),
            response_body = %clean_stringify_body(&response_body),
            "body dump"
        );
    }

    Response::from_parts(parts, Body::from(response_body))
}

/// Compact JSON for object bodies, the raw (lossy UTF-8) text otherwise.
pub fn clean_stringify_body(body: &[u8]) -> String {
    match serde_json::from_slice::<Map<String, Value>>(body) {
        Ok(object) => serde_json::to_string(&object)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned()),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}
