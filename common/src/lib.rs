/*!
common/src/lib.rs

Shared configuration types, the error taxonomy, and DB/logging helpers used by
`auth-service`, `news-service` and `gateway`.

This file provides:
- `Config` data structures (deserialized from TOML, secrets injected from the environment)
- An async loader for a TOML config file, with default+override merging
- Helpers to initialize a Postgres connection pool and run migrations
- A logging init helper shared by every binary
*/

pub mod error;

pub use error::{kind_from_status, AppError, ErrorKind};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;

/// Runtime environment the process is running in ("development", "staging", "production").
/// Grounded on the `env` field present in every one of the original `config.go` files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvConfig {
    pub env: String,
}

/// HTTP server configuration for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub timeout_secs: u64,
    pub idle_timeout_secs: u64,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Configuration for reaching (or, from inside the owning service, binding) a gRPC endpoint.
/// Shared shape for `grpc_auth` and `grpc_news`: auth-service/news-service read only `port`
/// from their own section (binding on `0.0.0.0:port`); gateway reads `host`+`port` to dial out,
/// plus `timeout_secs`/`retries_count` for the client-side retry behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrpcEndpointConfig {
    #[serde(default = "default_bind_host")]
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
    #[serde(default)]
    pub retries_count: u32,
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

impl GrpcEndpointConfig {
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    pub fn dial_address(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Redis connection settings, shared by LinkCache, session storage and the registration index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    /// Session/key expiry, in seconds. Absent for news-service's LinkCache, which is
    /// intentionally left unbounded (see SPEC_FULL.md's Open Question decision on the matter).
    #[serde(default)]
    pub expire_secs: Option<u64>,
}

impl RedisConfig {
    pub fn connection_url(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }
}

/// Postgres connection settings. `password` is never read from TOML; it is injected from the
/// `POSTGRES_PASSWORD` environment variable after the file is parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_deserializing, default)]
    pub password: String,
    pub dbname: String,
    pub sslmode: String,
}

impl PostgresConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.dbname, self.sslmode
        )
    }
}

/// Feed-fetching and article-retention knobs shared by news-service (fetch-side fields) and
/// gateway (serve-side fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsManagementConfig {
    #[serde(default)]
    pub filter_keywords: Vec<String>,
    pub fetch_interval_secs: u64,
    pub articles_limit: i64,
    pub refresh_interval_secs: u64,
    #[serde(default = "default_max_concurrent_items")]
    pub max_concurrent_items: usize,
}

fn default_max_concurrent_items() -> usize {
    8
}

/// JWT issuance settings. `secret_key` is never read from TOML; it is injected from the
/// `SECRET_KEY` environment variable after the file is parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenManagementConfig {
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    #[serde(skip_deserializing, default)]
    pub secret_key: String,
}

/// Admin / maintenance config, carried over from the teacher unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub auto_migrate: Option<bool>,
    pub diagnostics_dir: Option<String>,
}

/// Top-level application configuration (deserialized from config.toml). Every binary shares
/// this one schema and simply ignores the sections it has no use for, matching the approach
/// the teacher's own `common::Config` takes of one struct for all of its own services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub env: String,
    pub http: HttpConfig,
    pub grpc_auth: GrpcEndpointConfig,
    pub grpc_news: GrpcEndpointConfig,
    pub redis_storage: RedisConfig,
    pub psql_storage: PostgresConfig,
    pub news_managment: NewsManagementConfig,
    pub token_managment: TokenManagementConfig,
    pub admin: Option<AdminConfig>,
}

impl Config {
    /// Load configuration from a TOML file asynchronously, then inject secrets from the
    /// environment.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        cfg.inject_secrets()?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence), then secrets are
    /// injected from the environment.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let mut cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        cfg.inject_secrets()?;
        Ok(cfg)
    }

    /// Pull the values that must never live in a config file out of the environment.
    fn inject_secrets(&mut self) -> Result<()> {
        self.psql_storage.password = std::env::var("POSTGRES_PASSWORD")
            .context("POSTGRES_PASSWORD must be set in the environment")?;
        self.token_managment.secret_key =
            std::env::var("SECRET_KEY").context("SECRET_KEY must be set in the environment")?;
        Ok(())
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

/// Run SQL migrations using sqlx's migration macro against a Postgres pool. Expects a
/// `migrations` directory at the workspace root (sibling of every service crate).
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../migrations")
        .run(pool)
        .await
        .context("Failed to run sqlx migrations")?;

    Ok(())
}

/// Initialize a Postgres connection pool from a `PostgresConfig`.
pub async fn init_db_pool(cfg: &PostgresConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.connection_url())
        .await
        .with_context(|| format!("Failed to connect to postgres at {}:{}", cfg.host, cfg.port))
}

/// Initialize process-wide structured logging. `log_level` is an `EnvFilter` directive
/// (e.g. "info", "debug", "auth_service=debug,tower=warn").
pub fn init_logging(log_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_toml() -> &'static str {
        r#"
            env = "development"

            [http]
            address = "0.0.0.0:8080"
            timeout_secs = 15
            idle_timeout_secs = 60
            cors_origins = ["http://localhost:3003"]

            [grpc_auth]
            host = "auth-service"
            port = 50051
            timeout_secs = 5
            retries_count = 3

            [grpc_news]
            host = "news-service"
            port = 50052
            timeout_secs = 5
            retries_count = 3

            [redis_storage]
            host = "redis"
            port = 6379
            expire_secs = 86400

            [psql_storage]
            host = "postgres"
            port = 5432
            user = "news"
            dbname = "news"
            sslmode = "disable"

            [news_managment]
            filter_keywords = ["rust", "linux"]
            fetch_interval_secs = 300
            articles_limit = 20
            refresh_interval_secs = 30
            max_concurrent_items = 8

            [token_managment]
            access_token_ttl_secs = 900
            refresh_token_ttl_secs = 604800
        "#
    }

    #[test]
    fn config_parses_every_section() {
        let cfg: Config = toml::from_str(base_toml()).expect("parse config");
        assert_eq!(cfg.env, "development");
        assert_eq!(cfg.grpc_auth.port, 50051);
        assert_eq!(cfg.news_managment.filter_keywords.len(), 2);
        assert_eq!(cfg.token_managment.access_token_ttl_secs, 900);
        assert_eq!(cfg.redis_storage.expire_secs, Some(86400));
        assert!(cfg.psql_storage.password.is_empty());
    }

    #[test]
    fn merge_toml_overrides_leaf_values() {
        let mut base: toml::Value = toml::from_str(base_toml()).unwrap();
        let override_val: toml::Value = toml::from_str(
            r#"
            [http]
            address = "0.0.0.0:9090"
            "#,
        )
        .unwrap();
        merge_toml(&mut base, override_val);
        let cfg: Config = base.try_into().unwrap();
        assert_eq!(cfg.http.address, "0.0.0.0:9090");
        // Untouched sibling fields survive the merge.
        assert_eq!(cfg.http.timeout_secs, 15);
    }

    #[test]
    fn grpc_endpoint_addresses() {
        let cfg: Config = toml::from_str(base_toml()).unwrap();
        assert_eq!(cfg.grpc_auth.bind_address(), "0.0.0.0:50051");
        assert_eq!(cfg.grpc_auth.dial_address(), "http://auth-service:50051");
    }
}
