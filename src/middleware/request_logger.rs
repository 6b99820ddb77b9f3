/*
 * Responsibility
 * - One access-log line per request through the request's ContextLogger
 * - Must run inside context_logger (the logger is read from the request extensions)
 */
use std::time::Instant;

use axum::{
    Router,
    extract::Request,
    http::header,
    middleware::{self, Next},
    response::Response,
};
use tracing::Level;

use super::context_logger::{ContextLogger, LOG_TARGET};

pub fn apply<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn(request_logger_middleware))
}

async fn request_logger_middleware(req: Request, next: Next) -> Response {
    let logger = ContextLogger::current(req.extensions(), req.headers());
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let started = Instant::now();

    let res = next.run(req).await;

    if logger.enabled(Level::INFO) {
        tracing::info!(
            target: LOG_TARGET,
            parent: logger.span(),
            host = %host,
            uri = %uri,
            method = %method,
            status = res.status().as_u16(),
            latency = ?started.elapsed(),
            "request"
        );
    }

    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http, routing::get};
    use tower::ServiceExt;
    use tracing_subscriber::filter::LevelFilter;

    use crate::middleware::context_logger::{self, LOG_LEVEL_HEADER};
    use crate::test_support::Capture;

    fn app() -> Router {
        let router = Router::new().route("/teapot", get(|| async { http::StatusCode::IM_A_TEAPOT }));
        context_logger::apply(apply(router), LevelFilter::DEBUG)
    }

    #[tokio::test]
    async fn one_line_per_request_with_status_and_method() {
        let (capture, _guard) = Capture::install();

        let req = http::Request::builder()
            .uri("/teapot")
            .header(header::HOST, "maryread.test")
            .body(Body::empty())
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), http::StatusCode::IM_A_TEAPOT);

        let output = capture.take();
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("status=418"));
        assert!(output.contains("method=GET"));
        assert!(output.contains("host=maryread.test"));
        assert!(output.contains("user_id=anonymous"));
    }

    #[tokio::test]
    async fn quiet_level_suppresses_the_line() {
        let (capture, _guard) = Capture::install();

        let req = http::Request::builder()
            .uri("/teapot")
            .header(LOG_LEVEL_HEADER, "warn")
            .body(Body::empty())
            .unwrap();
        app().oneshot(req).await.unwrap();

        assert!(capture.take().is_empty());
    }
}
