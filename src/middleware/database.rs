/*
 * Responsibility
 * - Put the shared PgPool into each request's context
 * - Handlers read it with the Db extractor (or context::database)
 */
use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};
use sqlx::PgPool;

pub fn apply<S>(router: Router<S>, pool: PgPool) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(pool, database_middleware))
}

async fn database_middleware(State(pool): State<PgPool>, mut req: Request, next: Next) -> Response {
    req.extensions_mut().insert(pool);
    next.run(req).await
}
