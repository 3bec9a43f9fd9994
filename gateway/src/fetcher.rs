//! The gateway's own read-through fetch logic over `FeedCache` + `NewsClient`. Distinct from
//! news-service's own `Fetcher` (which owns RSS ingestion); this one only ever reads.
//!
//! Grounded on `original_source/back/app/apiService/internal/services/fetcher/fetcher.go`'s
//! cache-or-fallback shape, with the warm-up re-architected per SPEC_FULL.md §4.8: triggered
//! lazily by a page-1 cache miss rather than blocking at process start, 3 retries (not the
//! original's 5) with linear backoff.

use std::sync::Arc;
use std::time::Duration;

use common::ErrorKind;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::clients::NewsClient;
use crate::feed_cache::FeedCache;
use crate::models::Article;

pub struct FeedFetcher {
    news: NewsClient,
    cache: Arc<FeedCache>,
}

impl FeedFetcher {
    pub fn new(news: NewsClient, cache: Arc<FeedCache>) -> Self {
        Self { news, cache }
    }

    /// Used by `GET /home?page=N`: try the cache first; on a miss, serve this request straight
    /// from the News service and kick off an async warm-up so subsequent requests hit the cache.
    pub async fn fetch_articles_on_page(self: &Arc<Self>, page: i64) -> Result<Vec<Article>, common::AppError> {
        match self.cache.get_on_page(page).await {
            Ok(articles) => Ok(articles),
            Err(_) => {
                if page == 1 {
                    let this = self.clone();
                    tokio::spawn(async move { this.warm_up().await });
                }
                self.news.get_articles_by_page(page).await
            }
        }
    }

    /// Used by `GET /ws`: try the cache's full contents first, falling back to the News
    /// service and repopulating the cache synchronously on a miss.
    pub async fn fetch_articles(&self) -> Result<Vec<Article>, common::AppError> {
        match self.cache.get_all().await {
            Ok(articles) if !articles.is_empty() => Ok(articles),
            _ => {
                let articles = self.news.get_articles().await?;
                if let Err(e) = self.cache.add_articles(articles.clone()).await {
                    debug!(%e, "cache warm-up from fetch_articles skipped");
                }
                Ok(articles)
            }
        }
    }

    /// Up to 3 attempts, `i` second linear backoff, terminal on `NoPublishedArticles`.
    async fn warm_up(&self) {
        for attempt in 1..=3u32 {
            match self.news.get_articles().await {
                Ok(articles) => {
                    if let Err(e) = self.cache.add_articles(articles).await {
                        warn!(%e, "feed cache warm-up produced no articles to store");
                    } else {
                        info!(attempt, "feed cache warm-up succeeded");
                    }
                    return;
                }
                Err(e) if e.kind == ErrorKind::NoPublishedArticles => {
                    debug!("feed cache warm-up: no published articles, giving up");
                    return;
                }
                Err(e) => {
                    warn!(%e, attempt, "feed cache warm-up attempt failed");
                    tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
                }
            }
        }
    }

    /// Background loop: every `refresh_interval`, pull the newest article from the News
    /// service and push it to the front of the cache.
    pub async fn run_interval_fetch(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("gateway interval fetch: shutdown requested, exiting");
                    return;
                }
                _ = ticker.tick() => {
                    match self.news.get_newest_article().await {
                        Ok(article) => self.cache.add_article(article).await,
                        Err(e) if e.kind == ErrorKind::NoNewArticle => {
                            debug!("interval fetch: nothing new to add to feed cache");
                        }
                        Err(e) => error!(%e, "interval fetch failed"),
                    }
                }
            }
        }
    }
}
