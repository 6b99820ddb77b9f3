/*
 * Responsibility
 * - Shared context wired at startup (AppState)
 *   - auth gates, optional pool, per-request log level, http limits
 * - Clone-cheap (Arc inside AuthMiddleware, PgPool is an Arc)
 */
use sqlx::PgPool;
use tracing_subscriber::filter::LevelFilter;

use crate::{config::HttpConfig, middleware::AuthMiddleware};

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: AuthMiddleware,
    pub db: Option<PgPool>,
    pub log_level: LevelFilter,
    pub http: HttpConfig,
}

impl AppState {
    pub fn new(auth: AuthMiddleware, log_level: LevelFilter, http: HttpConfig) -> Self {
        Self {
            auth,
            db: None,
            log_level,
            http,
        }
    }

    pub fn with_db(mut self, pool: PgPool) -> Self {
        self.db = Some(pool);
        self
    }
}
