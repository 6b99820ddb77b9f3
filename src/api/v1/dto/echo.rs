/*
 * Responsibility
 * - /echo request/response DTO
 * - Field rules via validator derive, checked by ValidatedJson
 */
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct EchoRequest {
    #[validate(length(min = 1, max = 256))]
    pub message: String,
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EchoResponse {
    pub message: String,
    pub email: Option<String>,
    pub user_id: String,
}
