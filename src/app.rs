/*
 * Responsibility
 * - Load Config -> build dependencies (verifier, optional pool) -> assemble the Router
 * - Middleware order, outermost first:
 *   http (request id, body limit, timeout) -> allow_anonymous -> context_logger
 *   -> request_logger -> body_dump -> per-route auth gates -> handlers
 * - axum::serve() with graceful shutdown
 */
use anyhow::Result;
use axum::Router;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::{Config, LogConfig, LogFormat},
    middleware::{AuthMiddleware, body_dump, context_logger, http, request_logger},
    services::{
        auth::build_verifier,
        db::{self, DbSettings},
    },
    state::AppState,
};

const DEFAULT_FILTER: &str = "info,tower_http=info,maryread::request=trace";

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log);

    let verifier = build_verifier(&config.auth)?;
    let mut state = AppState::new(
        AuthMiddleware::new(verifier).with_log_level(config.log.default_level),
        config.log.default_level,
        config.http.clone(),
    );

    if let Some(database) = &config.database {
        let settings = DbSettings::from_config(database)?;
        state = state.with_db(db::bootstrap(&settings).await?);
        tracing::info!("database ready");
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, env = ?config.app_env, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// `RUST_LOG` wins over the default filter; the request target stays at
/// `trace` so per-request levels are decided by the context logger.
pub fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let v1 = api::v1::routes(&state);

    let router = Router::new().nest("/api/v1", v1);
    let router = body_dump::apply(router, state.http.body_limit_bytes);
    let router = request_logger::apply(router);
    let router = context_logger::apply(router, state.log_level);
    let router = state.auth.allow_anonymous(router);
    let router = http::apply(router, &state.http);

    router.with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
