/*
 * Responsibility
 * - GET /ping and GET /admin/ping (liveness, gate checks)
 */
use crate::middleware::ContextLogger;

pub async fn ping(logger: ContextLogger) -> &'static str {
    logger.debug("ping");
    "pong"
}

pub async fn admin_ping(logger: ContextLogger) -> &'static str {
    logger.info(format_args!("admin ping from {}", logger.user_id()));
    "pong"
}
