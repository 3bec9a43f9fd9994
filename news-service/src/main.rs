//! news-service binary: RSS ingestion loop and the gRPC surface over it. Promotion happens
//! synchronously inside the `GetNewestArticle` RPC (see `grpc.rs`/`processor.rs`), driven by
//! the gateway's own interval fetch — there is no separate promotion ticker here.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use common::Config;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing::info;

use news_service::article_store::ArticleStore;
use news_service::fetcher::Fetcher;
use news_service::grpc::NewsService;
use news_service::link_cache::LinkCache;
use news_service::processor::Processor;
use news_service::proto::news_server::NewsServer;
use news_service::source_store::SourceStore;

#[derive(Parser, Debug)]
#[command(name = "news-service", about = "RSS ingestion and article distribution")]
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
    info!(bind = %config.grpc_news.bind_address(), "configuration loaded");

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

    let link_cache = Arc::new(
        LinkCache::connect(&config.redis_storage.connection_url())
            .await
            .context("failed to connect to redis for link cache")?,
    );
    let articles = Arc::new(ArticleStore::new(db_pool.clone()));
    let sources = Arc::new(SourceStore::new(db_pool));

    let fetcher = Arc::new(Fetcher::new(
        sources,
        articles.clone(),
        link_cache,
        &config.news_managment.filter_keywords,
        config.news_managment.max_concurrent_items,
    ));

    let processor = Processor::new(articles, fetcher.clone());

    let shutdown = CancellationToken::new();

    let fetch_interval = Duration::from_secs(config.news_managment.fetch_interval_secs);
    let ingest_fetcher = fetcher.clone();
    let ingest_cancel = shutdown.clone();
    let ingest_task = tokio::spawn(async move {
        ingest_fetcher.start(fetch_interval, ingest_cancel).await;
    });

    let service = NewsService::new(processor, config.news_managment.articles_limit);

    let addr = config.grpc_news.bind_address().parse()?;
    info!(%addr, "news-service listening");

    let serve = Server::builder().add_service(NewsServer::new(service)).serve(addr);

    tokio::select! {
        result = serve => {
            result.context("gRPC server failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, shutting down");
        }
    }

    shutdown.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(10), ingest_task).await;

    Ok(())
}
