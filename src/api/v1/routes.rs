/*
 * Responsibility
 * - v1 URL structure
 * - Which auth gate wraps which sub-router
 * - /db routes only exist when a database is configured
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    api::v1::handlers::{
        db::db_ping,
        echo::echo,
        me::me,
        ping::{admin_ping, ping},
    },
    middleware::database,
    state::AppState,
};

pub const ADMIN_ROLE: &str = "admin";

pub fn routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/ping", get(ping))
        .route("/echo", post(echo));

    let user = state
        .auth
        .logged_user(Router::new().route("/me", get(me)));

    let admin = state
        .auth
        .with_role(Router::new().route("/admin/ping", get(admin_ping)), ADMIN_ROLE);

    let mut router = public.merge(user).merge(admin);

    if let Some(pool) = &state.db {
        let db = Router::new().route("/db/ping", get(db_ping));
        router = router.merge(database::apply(db, pool.clone()));
    }

    router
}
