//! A bounded, ordered read-through cache over the public feed, local to this process.
//!
//! Grounded on `original_source/back/app/apiService/internal/storage/cache/cache.go`'s
//! warm-up/page-retrieval shape, but re-targeted at a process-local `VecDeque` instead of
//! Redis (the original's cache is a second network hop the gateway doesn't need — it already
//! owns the only process that reads from it) and at newest-first shifting instead of
//! append-only growth, per the ordering invariant in SPEC_FULL.md §8.

use std::collections::VecDeque;

use common::{AppError, ErrorKind};
use tokio::sync::Mutex;

use crate::models::Article;

pub struct FeedCache {
    entries: Mutex<VecDeque<Article>>,
    limit: usize,
}

impl FeedCache {
    pub fn new(limit: i64) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            limit: limit.max(0) as usize,
        }
    }

    /// Warm-up: replace the whole cache content in one shot. Errors if given nothing to
    /// warm up with, rather than silently emptying an already-populated cache.
    pub async fn add_articles(&self, articles: Vec<Article>) -> Result<(), AppError> {
        if articles.is_empty() {
            return Err(AppError::new(
                ErrorKind::NoPublishedArticles,
                "nothing to warm the feed cache up with",
            ));
        }
        let mut guard = self.entries.lock().await;
        guard.clear();
        guard.extend(articles.into_iter().take(self.limit));
        Ok(())
    }

    /// Shift everything down by one and write `article` at index 0; evict the tail if over
    /// capacity. Used by the interval-fetch loop as new articles are promoted.
    pub async fn add_article(&self, article: Article) {
        let mut guard = self.entries.lock().await;
        guard.push_front(article);
        if guard.len() > self.limit {
            guard.pop_back();
        }
    }

    /// Newest `min(page * limit, actual)` entries, newest-first. `page` is 1-indexed, matching
    /// the HTTP `?page=N` query parameter.
    pub async fn get_on_page(&self, page: i64) -> Result<Vec<Article>, AppError> {
        let guard = self.entries.lock().await;
        if guard.is_empty() {
            return Err(AppError::new(ErrorKind::CacheEmpty, "feed cache is empty"));
        }
        let amount = (page.max(1) as usize).saturating_mul(self.limit);
        let take = amount.min(guard.len());
        Ok(guard.iter().take(take).cloned().collect())
    }

    /// The entire cache content, newest-first. Used by `/ws`, which pushes the whole feed on
    /// every tick rather than a single page.
    pub async fn get_all(&self) -> Result<Vec<Article>, AppError> {
        let guard = self.entries.lock().await;
        if guard.is_empty() {
            return Err(AppError::new(ErrorKind::CacheEmpty, "feed cache is empty"));
        }
        Ok(guard.iter().cloned().collect())
    }

    pub async fn actual(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: i64) -> Article {
        Article {
            article_id: id,
            user_name: "bot".to_string(),
            source_name: "src".to_string(),
            title: format!("title {id}"),
            link: format!("https://example.com/{id}"),
            excerpt: String::new(),
            image_url: String::new(),
            posted_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn get_on_page_empty_cache_errors() {
        let cache = FeedCache::new(10);
        let err = cache.get_on_page(1).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::CacheEmpty);
    }

    #[tokio::test]
    async fn add_articles_rejects_empty_warm_up() {
        let cache = FeedCache::new(10);
        let err = cache.add_articles(vec![]).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoPublishedArticles);
    }

    #[tokio::test]
    async fn add_article_shifts_newest_to_front_and_evicts_at_capacity() {
        let cache = FeedCache::new(2);
        cache.add_article(article(1)).await;
        cache.add_article(article(2)).await;
        cache.add_article(article(3)).await;

        let page = cache.get_on_page(1).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].article_id, 3);
        assert_eq!(page[1].article_id, 2);
        assert_eq!(cache.actual().await, 2);
    }

    #[tokio::test]
    async fn get_on_page_caps_at_actual() {
        let cache = FeedCache::new(10);
        cache.add_articles(vec![article(1), article(2)]).await.unwrap();

        let page = cache.get_on_page(5).await.unwrap();
        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn add_articles_truncates_to_limit() {
        let cache = FeedCache::new(1);
        cache
            .add_articles(vec![article(1), article(2), article(3)])
            .await
            .unwrap();
        assert_eq!(cache.actual().await, 1);
    }
}
