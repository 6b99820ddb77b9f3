/*
 * Responsibility
 * - GET /me: the verified identity of the caller
 */
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::v1::extractors::LoggedUser;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub uid: String,
    pub claims: Map<String, Value>,
}

pub async fn me(LoggedUser(token): LoggedUser) -> Json<MeResponse> {
    Json(MeResponse {
        uid: token.uid,
        claims: token.claims,
    })
}
