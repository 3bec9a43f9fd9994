//! The gateway's own wire representation of an article, shared by the HTTP, WebSocket and
//! FeedCache surfaces. Distinct from news-service's `Article` (which also carries `user_id`,
//! `published_at`, `created_at`): the gateway only ever sees what the News gRPC service chooses
//! to expose, i.e. exactly the `news.Article` message's fields.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub article_id: i64,
    pub user_name: String,
    pub source_name: String,
    pub title: String,
    pub link: String,
    pub excerpt: String,
    pub image_url: String,
    pub posted_at: String,
}

impl From<crate::proto::news::Article> for Article {
    fn from(a: crate::proto::news::Article) -> Self {
        Self {
            article_id: a.article_id,
            user_name: a.user_name,
            source_name: a.source_name,
            title: a.title,
            link: a.link,
            excerpt: a.excerpt,
            image_url: a.image_url,
            posted_at: a.posted_at,
        }
    }
}

pub fn from_proto_list(articles: Vec<crate::proto::news::Article>) -> Vec<Article> {
    articles.into_iter().map(Article::from).collect()
}
