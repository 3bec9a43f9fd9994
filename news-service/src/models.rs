//! Domain types shared across news-service's storage and extraction layers.

use chrono::{DateTime, Utc};

/// Bot sentinel owner id for ingested (non-user-submitted) articles. Never `0` — see
/// DESIGN.md's Open Question decision on this.
pub const BOT_USER_ID: i64 = 1;

/// A configured RSS source. Immutable after creation.
#[derive(Debug, Clone)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub feed_url: String,
}

/// A transient extraction result, produced by `ItemHandler` and consumed by `Fetcher`.
/// Never persisted standalone; it becomes an `Article` or is dropped.
#[derive(Debug, Clone)]
pub struct Item {
    pub title: String,
    pub categories: Vec<String>,
    pub link: String,
    pub date: DateTime<Utc>,
    pub excerpt: String,
    pub image_url: String,
    pub source_name: String,
}

/// A durable article record. `user_name` is denormalized onto every read via a `LEFT JOIN
/// users`, matching the reference implementation's `ArticlesByUid`/`LatestPosted` queries —
/// news-service never needs to call auth-service just to label an article with its owner.
#[derive(Debug, Clone)]
pub struct Article {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub source_name: String,
    pub title: String,
    pub link: String,
    pub excerpt: String,
    pub image_url: String,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn into_proto(self) -> crate::proto::Article {
        crate::proto::Article {
            article_id: self.id,
            user_name: self.user_name,
            source_name: self.source_name,
            title: self.title,
            link: self.link,
            excerpt: self.excerpt,
            image_url: self.image_url,
            posted_at: self
                .posted_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}
