/*
 * Responsibility
 * - POST /echo: bind + validate the body, answer it back with the caller id
 */
use axum::Json;

use crate::{
    api::v1::{
        dto::echo::{EchoRequest, EchoResponse},
        extractors::ValidatedJson,
    },
    middleware::ContextLogger,
};

pub async fn echo(
    logger: ContextLogger,
    ValidatedJson(req): ValidatedJson<EchoRequest>,
) -> Json<EchoResponse> {
    logger.debug(format_args!("echo {} bytes", req.message.len()));

    Json(EchoResponse {
        message: req.message,
        email: req.email,
        user_id: logger.user_id().to_string(),
    })
}
