//! HTTP-level middleware (cross-cutting concerns).
//!
//! Applied outermost, before any auth or logging layer:
//! - Request-Id generation + propagation (`x-request-id`)
//! - Body size limit
//! - Global timeout (408 on elapse)

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::config::HttpConfig;
use crate::context::REQUEST_ID_HEADER;

pub fn apply<S>(router: Router<S>, config: &HttpConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let layers = ServiceBuilder::new()
        // The router needs an `Infallible` service; timeouts become responses.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        .layer(TimeoutLayer::new(config.timeout));

    router.layer(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::{
        body::{Body, to_bytes},
        http,
        routing::{get, post},
    };
    use tower::ServiceExt;

    use crate::context;

    fn config() -> HttpConfig {
        HttpConfig {
            body_limit_bytes: 16,
            timeout: Duration::from_millis(50),
        }
    }

    async fn seen_request_id(req: axum::extract::Request) -> String {
        context::request_id(req.extensions(), req.headers())
    }

    fn app() -> Router {
        let router = Router::new()
            .route("/id", get(seen_request_id))
            .route("/upload", post(|body: String| async move { body }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            );
        apply(router, &config())
    }

    #[tokio::test]
    async fn generated_request_id_is_echoed() {
        let req = http::Request::builder().uri("/id").body(Body::empty()).unwrap();
        let res = app().oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let header = res
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(!header.is_empty());

        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, header.as_bytes());
    }

    #[tokio::test]
    async fn incoming_request_id_is_kept() {
        let req = http::Request::builder()
            .uri("/id")
            .header(REQUEST_ID_HEADER, "req-7")
            .body(Body::empty())
            .unwrap();
        let res = app().oneshot(req).await.unwrap();

        assert_eq!(res.headers().get(REQUEST_ID_HEADER).unwrap(), "req-7");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let req = http::Request::builder()
            .method("POST")
            .uri("/upload")
            .body(Body::from("x".repeat(64)))
            .unwrap();
        let res = app().oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn slow_handler_times_out() {
        let req = http::Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let res = app().oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
