//! Owns the periodic ingestion ticker, per-source fan-out, the keyword filter, and the
//! synchronous user-submission path.
//!
//! Grounded on `original_source/back/app/newsService/internal/services/fetcher/fetcher.go`:
//! `Start`/`intervalFetch`/`saveItems`/`itemShouldBeSkipped`/`SaveArticleFromUser`, with the
//! reconciliations SPEC_FULL.md §9 pins (symmetric lowercasing, empty-keywords-passes-all, and
//! eviction-on-skip, none of which the reference actually does) and the bounded worker pool
//! (`JoinSet` + semaphore) replacing the reference's unbounded per-source/per-item goroutines.

use std::collections::HashSet;
use std::sync::Arc;

use common::{AppError, ErrorKind};
use regex::RegexBuilder;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::article_store::ArticleStore;
use crate::item_handler::{interval_load, UserItemHandler};
use crate::link_cache::LinkCache;
use crate::models::Item;
use crate::source_store::SourceStore;

pub struct Fetcher {
    sources: Arc<SourceStore>,
    articles: Arc<ArticleStore>,
    link_cache: Arc<LinkCache>,
    user_handler: UserItemHandler,
    keyword_regexes: Vec<regex::Regex>,
    keyword_set: HashSet<String>,
    max_concurrent_items: usize,
}

impl Fetcher {
    pub fn new(
        sources: Arc<SourceStore>,
        articles: Arc<ArticleStore>,
        link_cache: Arc<LinkCache>,
        keywords: &[String],
        max_concurrent_items: usize,
    ) -> Self {
        let keyword_regexes = keywords
            .iter()
            .filter_map(|kw| {
                RegexBuilder::new(&format!(r"\b{}\b", regex::escape(&kw.to_lowercase())))
                    .case_insensitive(false)
                    .build()
                    .ok()
            })
            .collect();
        let keyword_set = keywords.iter().map(|k| k.to_lowercase()).collect();

        Self {
            sources,
            articles,
            link_cache: link_cache.clone(),
            user_handler: UserItemHandler::new(link_cache),
            keyword_regexes,
            keyword_set,
            max_concurrent_items,
        }
    }

    /// Runs until `cancel` fires. Invokes `interval_fetch` immediately, then on every tick of
    /// `fetch_interval`.
    pub async fn start(&self, fetch_interval: std::time::Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(fetch_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("fetcher: shutdown requested, exiting");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.interval_fetch(cancel.clone()).await {
                        if e.kind == ErrorKind::NoSources {
                            debug!("fetcher: no sources configured, skipping this tick");
                        } else {
                            warn!(%e, "fetcher: interval_fetch failed");
                        }
                    }
                }
            }
        }
    }

    /// Fans out one worker per source, each draining its own item channel and applying
    /// `filter + save`. Fan-out width is capped by `max_concurrent_items` via a semaphore shared
    /// across all per-item extraction tasks (not just per-source workers).
    pub async fn interval_fetch(&self, cancel: CancellationToken) -> Result<(), AppError> {
        let sources = self.sources.list().await?;

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_items));
        let mut workers = JoinSet::new();

        for source in sources {
            let link_cache = self.link_cache.clone();
            let articles = self.articles.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            let keyword_regexes = self.keyword_regexes.clone();
            let keyword_set = self.keyword_set.clone();

            workers.spawn(async move {
                let (tx, mut rx) = mpsc::channel::<Item>(32);
                let feed_url = source.feed_url.clone();
                let source_name = source.name.clone();

                let loader = tokio::spawn(async move {
                    interval_load(link_cache.clone(), feed_url, source_name, cancel, tx).await;
                });

                let mut item_tasks = JoinSet::new();

                while let Some(item) = rx.recv().await {
                    let permit = semaphore.clone().acquire_owned().await;
                    let articles = articles.clone();
                    let link_cache = link_cache.clone();
                    let keyword_regexes = keyword_regexes.clone();
                    let keyword_set = keyword_set.clone();

                    item_tasks.spawn(async move {
                        let _permit = permit;
                        if item_passes_filter(&item, &keyword_regexes, &keyword_set) {
                            if let Err(e) = save_item(&articles, &item).await {
                                debug!(link = %item.link, %e, "dropping item that failed to save");
                            }
                        } else {
                            debug!(link = %item.link, "item skipped by keyword filter");
                            let hash = LinkCache::hash(&item.link);
                            if let Err(e) = link_cache.delete(&hash).await {
                                warn!(%e, "failed to evict skipped item's link from cache");
                            }
                        }
                    });
                }

                let _ = loader.await;
                while item_tasks.join_next().await.is_some() {}
            });
        }

        while workers.join_next().await.is_some() {}
        Ok(())
    }

    pub async fn save_from_user(&self, user_id: i64, link: &str) -> Result<(), AppError> {
        let item = self.user_handler.load(link).await?;
        save_item_as(&self.articles, &item, user_id).await
    }

    pub async fn update_from_user(&self, user_id: i64, article_id: i64, old_link: &str, new_link: &str) -> Result<(), AppError> {
        let item = self.user_handler.update(old_link, new_link).await?;
        self.articles
            .update(user_id, article_id, &item.link, &item.title, &item.excerpt, &item.image_url, item.date)
            .await
    }

    pub async fn delete_from_user(&self, user_id: i64, article_id: i64, link: &str) -> Result<(), AppError> {
        self.articles.delete(user_id, article_id).await?;
        self.user_handler.delete(link).await
    }
}

async fn save_item(articles: &ArticleStore, item: &Item) -> Result<(), AppError> {
    save_item_as(articles, item, crate::models::BOT_USER_ID).await
}

async fn save_item_as(articles: &ArticleStore, item: &Item, user_id: i64) -> Result<(), AppError> {
    articles
        .save(user_id, &item.source_name, &item.title, &item.link, &item.excerpt, &item.image_url, item.date)
        .await
        .map(|_| ())
}

/// An item passes when ANY of: a (lowercased) category matches the (lowercased) keyword set, or
/// the (lowercased) title matches one of the compiled keyword regexes. An empty keyword list
/// passes everything.
fn item_passes_filter(item: &Item, keyword_regexes: &[regex::Regex], keyword_set: &HashSet<String>) -> bool {
    if keyword_set.is_empty() {
        return true;
    }

    let category_match = item
        .categories
        .iter()
        .any(|c| keyword_set.contains(&c.to_lowercase()));
    if category_match {
        return true;
    }

    let title = item.title.to_lowercase();
    keyword_regexes.iter().any(|re| re.is_match(&title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(title: &str, categories: &[&str]) -> Item {
        Item {
            title: title.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            link: "https://example.com/a".to_string(),
            date: Utc::now(),
            excerpt: String::new(),
            image_url: String::new(),
            source_name: "Example".to_string(),
        }
    }

    fn regexes(keywords: &[&str]) -> Vec<regex::Regex> {
        keywords
            .iter()
            .map(|kw| RegexBuilder::new(&format!(r"\b{}\b", regex::escape(&kw.to_lowercase()))).build().unwrap())
            .collect()
    }

    #[test]
    fn empty_keywords_passes_everything() {
        let set = HashSet::new();
        assert!(item_passes_filter(&item("anything", &[]), &[], &set));
    }

    #[test]
    fn title_word_boundary_match() {
        let set: HashSet<String> = ["rust".to_string()].into_iter().collect();
        let re = regexes(&["rust"]);
        assert!(item_passes_filter(&item("Rust at scale", &[]), &re, &set));
        assert!(!item_passes_filter(&item("trust but verify", &[]), &re, &set));
    }

    #[test]
    fn category_match_is_case_insensitive() {
        let set: HashSet<String> = ["linux".to_string()].into_iter().collect();
        assert!(item_passes_filter(&item("unrelated", &["Linux"]), &[], &set));
    }

    #[test]
    fn mixed_case_configured_keyword_matches_lowercased_title() {
        // A configured keyword like "Rust" must still match the (always-lowercased) title;
        // the regex is built from the lowercased keyword, matching the lowercased category path.
        let set: HashSet<String> = ["rust".to_string()].into_iter().collect();
        let re = regexes(&["Rust"]);
        assert!(item_passes_filter(&item("Rust at scale", &[]), &re, &set));
    }
}
