/*
 * Responsibility
 * - Bind a JSON body and validate it (validator derive) in one extractor
 * - Binding failures keep axum's own JsonRejection response
 * - Validation failures -> 400 AppError
 */
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[derive(Debug, Error)]
pub enum ValidatedJsonRejection {
    #[error(transparent)]
    Json(#[from] JsonRejection),
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        match self {
            ValidatedJsonRejection::Json(rejection) => rejection.into_response(),
            ValidatedJsonRejection::Invalid(errors) => invalid(&errors).into_response(),
        }
    }
}

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Validate `value`, mapping failures to a 400. Call `Validate::validate`
/// directly to get the raw `ValidationErrors` instead.
pub fn validate<T: Validate>(value: &T) -> Result<(), AppError> {
    value.validate().map_err(|errors| invalid(&errors))
}

fn invalid(errors: &ValidationErrors) -> AppError {
    let message = errors.to_string().replace('\n', ", ");
    AppError::bad_request(VALIDATION_FAILED, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{self, StatusCode},
        routing::post,
    };
    use serde::Deserialize;
    use serde_json::Value;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct User {
        #[validate(length(min = 1))]
        name: String,
        #[validate(email)]
        email: String,
    }

    fn user(name: &str, email: &str) -> User {
        User {
            name: name.into(),
            email: email.into(),
        }
    }

    #[test]
    fn validate_maps_failures_to_bad_request() {
        assert!(validate(&user("Truman", "truman@capote.com")).is_ok());

        for invalid in [
            user("", "truman"),
            user("", "truman@capote.com"),
            user("Truman", ""),
            user("Truman", "truman"),
        ] {
            match validate(&invalid) {
                Err(AppError::BadRequest { code, message }) => {
                    assert_eq!(code, VALIDATION_FAILED);
                    assert!(!message.is_empty());
                }
                other => panic!("expected a bad request, got {other:?}"),
            }
        }
    }

    #[test]
    fn raw_errors_name_the_failing_fields() {
        let errors = user("", "truman").validate().unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
    }

    async fn create(ValidatedJson(user): ValidatedJson<User>) -> String {
        user.name
    }

    async fn post_json(body: &str) -> (StatusCode, Vec<u8>) {
        let app = Router::new().route("/users", post(create));
        let req = http::Request::builder()
            .method("POST")
            .uri("/users")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn valid_body_reaches_the_handler() {
        let (status, body) = post_json(r#"{"name":"Truman","email":"truman@capote.com"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"Truman");
    }

    #[tokio::test]
    async fn invalid_body_is_bad_request() {
        let (status, body) = post_json(r#"{"name":"","email":"truman"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], VALIDATION_FAILED);
    }

    #[tokio::test]
    async fn malformed_json_keeps_axum_rejection() {
        let (status, _) = post_json(r#"{"name":"Truman""#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_json(r#"{"name":"Truman"}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
