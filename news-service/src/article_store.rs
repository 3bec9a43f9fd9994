//! Durable article storage: uniqueness on link, ownership, and the `posted_at` promotion gate.
//!
//! Grounded on `original_source/back/app/newsService/internal/storage/psql/articles.go`, with
//! the reconciliations SPEC_FULL.md §9 pins: `newest_not_posted` collapsed to one parameterized
//! query instead of the reference's two-query bot/user fallback, `latest_posted` ordered
//! descending (matching `latest_posted_with_limit` rather than the reference's ascending order),
//! and pool-acquisition retry replacing the reference's per-statement `prepareStmt` retry.

use chrono::{DateTime, Utc};
use common::{AppError, ErrorKind};
use sqlx::{PgPool, Row};
use tokio::time::Duration;

use crate::models::{Article, BOT_USER_ID};

const SAVE_RETRIES: u32 = 3;

const SELECT_COLUMNS: &str = "a.article_id, a.user_id, u.user_name, a.source_name, a.title, a.link, \
     a.excerpt, a.image_url, a.published_at, a.created_at, a.posted_at";

pub struct ArticleStore {
    pool: PgPool,
}

impl ArticleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_article(row: &sqlx::postgres::PgRow) -> Article {
        Article {
            id: row.get("article_id"),
            user_id: row.get("user_id"),
            user_name: row.get("user_name"),
            source_name: row.get("source_name"),
            title: row.get("title"),
            link: row.get("link"),
            excerpt: row.get("excerpt"),
            image_url: row.get("image_url"),
            published_at: row.get("published_at"),
            created_at: row.get("created_at"),
            posted_at: row.get("posted_at"),
        }
    }

    /// Inserts a new article. A unique-link violation maps immediately to `ErrArticleExists`
    /// (no point retrying a conflict); any other, presumably-transient error is retried up to
    /// `SAVE_RETRIES` times with an `i`-second backoff, matching the reference's `retrySave`.
    pub async fn save(
        &self,
        user_id: i64,
        source_name: &str,
        title: &str,
        link: &str,
        excerpt: &str,
        image_url: &str,
        published_at: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let user_id = if user_id == 0 { BOT_USER_ID } else { user_id };

        let mut last_err: Option<AppError> = None;
        for attempt in 1..=SAVE_RETRIES {
            let result = sqlx::query_scalar::<_, i64>(
                "INSERT INTO articles (user_id, source_name, title, link, excerpt, image_url, published_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 RETURNING article_id",
            )
            .bind(user_id)
            .bind(source_name)
            .bind(title)
            .bind(link)
            .bind(excerpt)
            .bind(image_url)
            .bind(published_at)
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(id) => return Ok(id),
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    return Err(AppError::new(ErrorKind::ArticleExists, "article link already exists"));
                }
                Err(e) => {
                    last_err = Some(AppError::new(ErrorKind::Internal, format!("can't save article: {e}")));
                    if attempt < SAVE_RETRIES {
                        tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| AppError::new(ErrorKind::Internal, "can't save article")))
    }

    /// Updates only while `posted_at IS NULL`. A unique-link conflict on the new link surfaces
    /// as `ErrArticleExists`; no matching un-posted row (wrong id, wrong owner, or already
    /// posted) surfaces as `ErrArticleNotAvailable`.
    pub async fn update(
        &self,
        user_id: i64,
        article_id: i64,
        link: &str,
        title: &str,
        excerpt: &str,
        image_url: &str,
        published_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE articles SET link = $1, title = $2, excerpt = $3, image_url = $4,
                 published_at = $5, created_at = now()
             WHERE article_id = $6 AND user_id = $7 AND posted_at IS NULL
             RETURNING article_id",
        )
        .bind(link)
        .bind(title)
        .bind(excerpt)
        .bind(image_url)
        .bind(published_at)
        .bind(article_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(AppError::new(ErrorKind::ArticleNotAvailable, "article not available for update")),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::new(ErrorKind::ArticleExists, "article link already exists"))
            }
            Err(e) => Err(AppError::new(ErrorKind::Internal, format!("can't update article: {e}"))),
        }
    }

    pub async fn delete(&self, user_id: i64, article_id: i64) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM articles WHERE article_id = $1 AND user_id = $2 AND posted_at IS NULL
             RETURNING article_id",
        )
        .bind(article_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't delete article: {e}")))?;

        result
            .map(|_| ())
            .ok_or_else(|| AppError::new(ErrorKind::ArticleNotAvailable, "article not available for delete"))
    }

    /// Resolves the current link for an article, used to evict the old hash from LinkCache
    /// before an update replaces it.
    pub async fn link_by_id(&self, article_id: i64) -> Result<String, AppError> {
        let link: Option<String> = sqlx::query_scalar("SELECT link FROM articles WHERE article_id = $1")
            .bind(article_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't look up link: {e}")))?;

        link.ok_or_else(|| AppError::new(ErrorKind::NoLink, "no link for article"))
    }

    pub async fn articles_by_uid(&self, user_id: i64) -> Result<Vec<Article>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM articles a JOIN users u ON u.user_id = a.user_id
             WHERE a.posted_at IS NULL AND a.user_id = $1
             ORDER BY a.created_at DESC",
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't list user articles: {e}")))?;

        Ok(rows.iter().map(Self::row_to_article).collect())
    }

    /// Newest-first; reconciled to descending per SPEC_FULL.md §9, matching
    /// `latest_posted_with_limit`.
    pub async fn latest_posted(&self) -> Result<Vec<Article>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM articles a JOIN users u ON u.user_id = a.user_id
             WHERE a.posted_at IS NOT NULL
             ORDER BY a.posted_at DESC",
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't list posted articles: {e}")))?;

        Ok(rows.iter().map(Self::row_to_article).collect())
    }

    pub async fn latest_posted_with_limit(&self, limit: i64) -> Result<Vec<Article>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM articles a JOIN users u ON u.user_id = a.user_id
             WHERE a.posted_at IS NOT NULL
             ORDER BY a.posted_at DESC
             LIMIT $1",
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't list posted articles: {e}")))?;

        Ok(rows.iter().map(Self::row_to_article).collect())
    }

    /// Two-tier selection collapsed into one query: `(user_id > 1) DESC` puts any user
    /// submission ahead of every bot-ingested article, `published_at DESC` breaks ties within
    /// each tier. This is the user-preemption invariant from SPEC_FULL.md §8.
    pub async fn newest_not_posted(&self) -> Result<Article, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM articles a JOIN users u ON u.user_id = a.user_id
             WHERE a.posted_at IS NULL
             ORDER BY (a.user_id > 1) DESC, a.published_at DESC
             LIMIT 1",
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't select newest article: {e}")))?;

        row.as_ref()
            .map(Self::row_to_article)
            .ok_or_else(|| AppError::new(ErrorKind::NoNewArticle, "no new article to promote"))
    }

    /// Sets `posted_at = now()`; the only writer of this column. Returns the stamped timestamp.
    pub async fn mark_posted(&self, article_id: i64) -> Result<DateTime<Utc>, AppError> {
        let posted_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            "UPDATE articles SET posted_at = now() WHERE article_id = $1 RETURNING posted_at",
        )
        .bind(article_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't mark article posted: {e}")))?;

        posted_at.ok_or_else(|| AppError::new(ErrorKind::ArticleNotAvailable, "article not found to mark posted"))
    }
}
