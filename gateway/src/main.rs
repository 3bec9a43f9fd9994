//! gateway binary: HTTP+WebSocket surface over auth-service/news-service, served by Rocket
//! alongside a background feed-cache refresh loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use common::Config;
use tokio_util::sync::CancellationToken;
use tracing::info;

use gateway::clients::{AuthClient, NewsClient};
use gateway::cors::Cors;
use gateway::feed_cache::FeedCache;
use gateway::fetcher::FeedFetcher;
use gateway::identity::RefreshFairing;
use gateway::metrics::{GatewayMetrics, MetricsFairing};
use gateway::state::AppState;
use gateway::{metrics, routes, ws};

#[derive(Parser, Debug)]
#[command(name = "gateway", about = "HTTP/WebSocket surface over auth-service and news-service")]
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
    info!(address = %config.http.address, "configuration loaded");

    let auth = AuthClient::connect(&config.grpc_auth).context("failed to set up auth-service client")?;
    let news = NewsClient::connect(&config.grpc_news).context("failed to set up news-service client")?;

    let feed_cache = Arc::new(FeedCache::new(config.news_managment.articles_limit));
    let feed_fetcher = Arc::new(FeedFetcher::new(news.clone(), feed_cache.clone()));

    let metrics = Arc::new(GatewayMetrics::new().context("failed to set up prometheus registry")?);

    let refresh_interval = Duration::from_secs(config.news_managment.refresh_interval_secs);
    let state = AppState {
        auth,
        news,
        feed_cache,
        feed_fetcher: feed_fetcher.clone(),
        refresh_ttl: Duration::from_secs(config.token_managment.refresh_token_ttl_secs as u64),
        request_timeout: Duration::from_secs(config.http.timeout_secs),
        ws_push_interval: refresh_interval / 2,
        metrics,
    };

    let shutdown = CancellationToken::new();
    let interval_fetch_cancel = shutdown.clone();
    let interval_fetch_task = tokio::spawn(async move {
        feed_fetcher.run_interval_fetch(refresh_interval, interval_fetch_cancel).await;
    });

    let figment = rocket::Config::figment()
        .merge(("address", config.http.address.split(':').next().unwrap_or("0.0.0.0")))
        .merge((
            "port",
            config
                .http
                .address
                .rsplit(':')
                .next()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8000),
        ));

    let rocket = rocket::custom(figment)
        .manage(state)
        .attach(RefreshFairing)
        .attach(MetricsFairing)
        .attach(Cors {
            allowed_origins: config.http.cors_origins.clone(),
        })
        .mount("/", routes::routes())
        .mount("/", ws::routes())
        .mount("/", metrics::routes())
        .register("/", routes::catchers());

    let launch = rocket.launch();

    tokio::select! {
        result = launch => {
            result.context("rocket server failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, shutting down");
        }
    }

    shutdown.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(10), interval_fetch_task).await;

    Ok(())
}
