//! Thin orchestrator between `ArticleStore` queries and `Fetcher` mutations.
//!
//! Grounded on `original_source/back/app/newsService/internal/services/fetcher/fetcher.go`'s
//! promotion call path (`newest_not_posted` → `mark_posted`). Every mutation is followed by a
//! re-read of `articles_by_uid` so callers receive the authoritative post-state in one
//! round-trip, matching the reference's handler-level "return the full list after any write".

use std::sync::Arc;

use common::AppError;

use crate::article_store::ArticleStore;
use crate::fetcher::Fetcher;
use crate::models::Article;

#[derive(Clone)]
pub struct Processor {
    articles: Arc<ArticleStore>,
    fetcher: Arc<Fetcher>,
}

impl Processor {
    pub fn new(articles: Arc<ArticleStore>, fetcher: Arc<Fetcher>) -> Self {
        Self { articles, fetcher }
    }

    pub async fn get_articles_by_uid(&self, user_id: i64) -> Result<Vec<Article>, AppError> {
        self.articles.articles_by_uid(user_id).await
    }

    pub async fn save_article(&self, user_id: i64, link: &str) -> Result<Vec<Article>, AppError> {
        self.fetcher.save_from_user(user_id, link).await?;
        self.articles.articles_by_uid(user_id).await
    }

    pub async fn update_article(
        &self,
        user_id: i64,
        article_id: i64,
        link: &str,
    ) -> Result<Vec<Article>, AppError> {
        let old_link = self.articles.link_by_id(article_id).await?;
        self.fetcher
            .update_from_user(user_id, article_id, &old_link, link)
            .await?;
        self.articles.articles_by_uid(user_id).await
    }

    pub async fn delete_article(&self, user_id: i64, article_id: i64) -> Result<Vec<Article>, AppError> {
        let link = self.articles.link_by_id(article_id).await?;
        self.fetcher.delete_from_user(user_id, article_id, &link).await?;
        self.articles.articles_by_uid(user_id).await
    }

    pub async fn get_articles(&self) -> Result<Vec<Article>, AppError> {
        self.articles.latest_posted().await
    }

    pub async fn get_articles_by_page(&self, page: i64, limit: i64) -> Result<Vec<Article>, AppError> {
        self.articles.latest_posted_with_limit(page * limit).await
    }

    /// `newest_not_posted → mark_posted`, stamping the returned article with its new
    /// `posted_at`. The atomic unit that moves an article into the public feed. This is what
    /// the `GetNewestArticle` RPC calls — the gateway's interval fetch polls that RPC at
    /// `refresh_interval`, so every call here both promotes and supplies one genuinely-posted
    /// article to the public feed; there is no separate promotion driver.
    pub async fn select_and_send(&self) -> Result<Article, AppError> {
        let mut article = self.articles.newest_not_posted().await?;
        let posted_at = self.articles.mark_posted(article.id).await?;
        article.posted_at = Some(posted_at);
        Ok(article)
    }
}
