/*
 * Responsibility
 * - Load environment variables / .env (port, log level, identity provider, database, http limits)
 * - Validate values at startup (missing or malformed -> ConfigError, never a panic)
 */
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub default_level: LevelFilter,
    pub format: LogFormat,
}

/// Identity-provider settings used to build the token verifier.
#[derive(Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub algorithm: Algorithm,
    pub public_key_pem: Option<String>,
    pub secret: Option<String>,
    pub leeway_seconds: u64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("algorithm", &self.algorithm)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub connect_options: PgConnectOptions,
    pub max_connections: u32,
    pub auto_migrate: bool,
    pub migration_path: PathBuf,
    pub connect_retries: u32,
    pub connect_backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub body_limit_bytes: usize,
    pub timeout: Duration,
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub log: LogConfig,
    pub auth: AuthConfig,
    pub database: Option<DatabaseConfig>,
    pub http: HttpConfig,
}

const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup (the process env in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parsed(&lookup, "PORT", 3000)?;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let default_level: LevelFilter = parsed(&lookup, "LOG_LEVEL", LevelFilter::DEBUG)?;
        let format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(_) => return Err(ConfigError::Invalid("LOG_FORMAT")),
            None if app_env.is_production() => LogFormat::Json,
            None => LogFormat::Pretty,
        };

        let auth = AuthConfig::from_lookup(&lookup)?;
        let database = database_from_lookup(&lookup)?;

        let http = HttpConfig {
            body_limit_bytes: parsed(&lookup, "HTTP_BODY_LIMIT_BYTES", 1024 * 1024)?,
            timeout: Duration::from_secs(parsed(&lookup, "HTTP_TIMEOUT_SECONDS", 30)?),
        };

        Ok(Self {
            addr,
            app_env,
            log: LogConfig {
                default_level,
                format,
            },
            auth,
            database,
            http,
        })
    }
}

impl AuthConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_id = lookup("AUTH_PROJECT_ID").filter(|s| !s.trim().is_empty());

        let issuer = match (lookup("AUTH_ISSUER"), &project_id) {
            (Some(issuer), _) => issuer,
            (None, Some(project)) => format!("{FIREBASE_ISSUER_PREFIX}{project}"),
            (None, None) => return Err(ConfigError::Missing("AUTH_ISSUER")),
        };

        let audience = lookup("AUTH_AUDIENCE")
            .or_else(|| project_id.clone())
            .ok_or(ConfigError::Missing("AUTH_AUDIENCE"))?;

        let algorithm = match lookup("AUTH_JWT_ALGORITHM") {
            Some(name) => {
                Algorithm::from_str(&name).map_err(|_| ConfigError::Invalid("AUTH_JWT_ALGORITHM"))?
            }
            None => Algorithm::RS256,
        };

        let public_key_pem = lookup("AUTH_JWT_PUBLIC_KEY_PEM").map(|pem| pem.replace("\\n", "\n"));
        let secret = lookup("AUTH_JWT_SECRET");

        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 if secret.is_none() => {
                return Err(ConfigError::Missing("AUTH_JWT_SECRET"));
            }
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {}
            _ if public_key_pem.is_none() => {
                return Err(ConfigError::Missing("AUTH_JWT_PUBLIC_KEY_PEM"));
            }
            _ => {}
        }

        Ok(Self {
            issuer,
            audience,
            algorithm,
            public_key_pem,
            secret,
            leeway_seconds: parsed(lookup, "AUTH_LEEWAY_SECONDS", 60)?,
        })
    }
}

/// Discrete Postgres connection parameters (`POSTGRES_*`).
#[derive(Debug, Clone, PartialEq)]
pub struct PostgresEnv {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub sslmode: String,
}

impl PostgresEnv {
    pub const HOST: &'static str = "POSTGRES_HOST";
    pub const PORT: &'static str = "POSTGRES_PORT";
    pub const USER: &'static str = "POSTGRES_USER";
    pub const PASSWORD: &'static str = "POSTGRES_PASSWORD";
    pub const DBNAME: &'static str = "POSTGRES_DBNAME";
    pub const SSLMODE: &'static str = "POSTGRES_SSLMODE";

    /// All six variables are required once any of them is used.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = required(lookup, Self::HOST)?;
        let port = required(lookup, Self::PORT)?
            .parse()
            .map_err(|_| ConfigError::Invalid(Self::PORT))?;
        let user = required(lookup, Self::USER)?;
        let password = required(lookup, Self::PASSWORD)?;
        let dbname = required(lookup, Self::DBNAME)?;
        let sslmode = required(lookup, Self::SSLMODE)?;

        PgSslMode::from_str(&sslmode).map_err(|_| ConfigError::Invalid(Self::SSLMODE))?;

        Ok(Self {
            host,
            port,
            user,
            password,
            dbname,
            sslmode,
        })
    }

    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        let ssl_mode =
            PgSslMode::from_str(&self.sslmode).map_err(|_| ConfigError::Invalid(Self::SSLMODE))?;

        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.dbname)
            .ssl_mode(ssl_mode))
    }
}

fn database_from_lookup<F>(lookup: &F) -> Result<Option<DatabaseConfig>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let connect_options = if let Some(url) = lookup("DATABASE_URL") {
        PgConnectOptions::from_str(&url).map_err(|_| ConfigError::Invalid("DATABASE_URL"))?
    } else if lookup(PostgresEnv::HOST).is_some() {
        PostgresEnv::from_lookup(lookup)?.connect_options()?
    } else {
        return Ok(None);
    };

    Ok(Some(DatabaseConfig {
        connect_options,
        max_connections: parsed(lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
        auto_migrate: parsed(lookup, "DATABASE_AUTO_MIGRATE", true)?,
        migration_path: lookup("DATABASE_MIGRATION_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./migrations")),
        connect_retries: parsed(lookup, "DATABASE_CONNECT_RETRIES", 5)?,
        connect_backoff: Duration::from_millis(parsed(lookup, "DATABASE_CONNECT_BACKOFF_MS", 1000)?),
    }))
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or(ConfigError::Missing(key))
}

fn parsed<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}
