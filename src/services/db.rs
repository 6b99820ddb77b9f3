/*
 * Responsibility
 * - Postgres pool bootstrap (exponential backoff while the database comes up)
 * - Migrations on startup (sqlx::migrate)
 * - Settings are validated on construction; nothing here runs per request
 */
use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use thiserror::Error;

use crate::config::DatabaseConfig;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("unable to connect to the database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("unable to apply migrations: {0}")]
    Migrate(#[from] MigrateError),

    #[error("auto migration is enabled but no migration path was provided")]
    MissingMigrationPath,
}

/// Exponential backoff: `initial_delay * 2^attempt`, `retries` extra attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 5,
            initial_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        self.initial_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Run `op` until it succeeds or the policy is exhausted; returns the last error.
pub async fn with_backoff<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.retries => {
                let delay = policy.delay(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbSettings {
    connect_options: PgConnectOptions,
    max_connections: u32,
    migration_path: Option<PathBuf>,
    auto_migrate: bool,
    retry: RetryPolicy,
}

impl DbSettings {
    pub fn new(
        connect_options: PgConnectOptions,
        auto_migrate: bool,
        migration_path: Option<PathBuf>,
    ) -> Result<Self, DbError> {
        if auto_migrate && migration_path.is_none() {
            return Err(DbError::MissingMigrationPath);
        }

        Ok(Self {
            connect_options,
            max_connections: 5,
            migration_path,
            auto_migrate,
            retry: RetryPolicy::default(),
        })
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self, DbError> {
        Ok(Self::new(
            config.connect_options.clone(),
            config.auto_migrate,
            Some(config.migration_path.clone()),
        )?
        .max_connections(config.max_connections)
        .retry(RetryPolicy {
            retries: config.connect_retries,
            initial_delay: config.connect_backoff,
        }))
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Open the pool; `connect_with` only returns once a connection was established.
pub async fn connect(settings: &DbSettings) -> Result<PgPool, DbError> {
    with_backoff(&settings.retry, |_| {
        PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_with(settings.connect_options.clone())
    })
    .await
    .map_err(DbError::Connect)
}

pub async fn migrate(pool: &PgPool, path: PathBuf) -> Result<(), DbError> {
    let migrator = Migrator::new(path).await?;
    migrator.run(pool).await?;
    Ok(())
}

/// Connect, then apply migrations when enabled.
pub async fn bootstrap(settings: &DbSettings) -> Result<PgPool, DbError> {
    let pool = connect(settings).await?;

    if settings.auto_migrate {
        let path = settings
            .migration_path
            .clone()
            .ok_or(DbError::MissingMigrationPath)?;
        tracing::info!(path = %path.display(), "applying migrations");
        migrate(&pool, path).await?;
    }

    Ok(pool)
}
