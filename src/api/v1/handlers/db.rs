/*
 * Responsibility
 * - GET /db/ping: round trip to the injected pool
 */
use axum::Json;
use serde_json::{Value, json};

use crate::{api::v1::extractors::Db, error::AppError};

pub async fn db_ping(Db(pool): Db) -> Result<Json<Value>, AppError> {
    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await?;
    Ok(Json(json!({ "status": "ok", "result": one })))
}
