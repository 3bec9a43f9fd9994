//! auth-service binary: credential storage, JWT issuance and session refresh, served over gRPC.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use common::Config;
use tonic::transport::Server;
use tracing::info;

use auth_service::grpc::AuthService;
use auth_service::proto::auth_server::AuthServer;
use auth_service::service::AuthCore;
use auth_service::storage::{RegistrationIndex, SessionStorage, UserStorage};
use auth_service::token::TokenManager;

#[derive(Parser, Debug)]
#[command(name = "auth-service", about = "Credential storage and token issuance")]
struct Args {
    /// Path to an override config.toml; merged on top of config.default.toml if present.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    common::init_logging(&args.log_level)?;

    let default_path = PathBuf::from("config.default.toml");
    let override_path = match args.config {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("specified config file not found: {}", p.display());
            }
            Some(p)
        }
        None => {
            let p = PathBuf::from("config.toml");
            p.exists().then_some(p)
        }
    };

    let config = Config::load_with_defaults(
        default_path.exists().then_some(default_path.as_path()),
        override_path.as_deref(),
    )
    .await
    .context("failed to load configuration")?;
    info!(bind = %config.grpc_auth.bind_address(), "configuration loaded");

    let db_pool = common::init_db_pool(&config.psql_storage).await?;

    if config
        .admin
        .as_ref()
        .and_then(|a| a.auto_migrate)
        .unwrap_or(false)
    {
        info!("running database migrations");
        common::run_migrations(&db_pool).await?;
    }

    let users = Arc::new(UserStorage::new(db_pool.clone()));

    let sessions = Arc::new(
        SessionStorage::connect(
            &config.redis_storage.connection_url(),
            config.redis_storage.expire_secs,
        )
        .await
        .context("failed to connect to redis for session storage")?,
    );

    let registration_index = Arc::new(
        RegistrationIndex::connect(&config.redis_storage.connection_url())
            .await
            .context("failed to connect to redis for the registration index")?,
    );

    info!("warming up registration index from postgres");
    let users_info = users.get_info().await.context("failed to list users for warm-up")?;
    registration_index
        .warm_up(&users_info)
        .await
        .context("failed to warm up registration index")?;

    let tokens = TokenManager::new(
        config.token_managment.access_token_ttl_secs,
        config.token_managment.refresh_token_ttl_secs,
        config.token_managment.secret_key.clone(),
    );

    let core = AuthCore::new(users, sessions, registration_index.clone(), tokens);
    let service = AuthService::new(core, registration_index);

    let addr = config.grpc_auth.bind_address().parse()?;
    info!(%addr, "auth-service listening");

    Server::builder()
        .add_service(AuthServer::new(service))
        .serve(addr)
        .await
        .context("gRPC server failed")?;

    Ok(())
}
