//! Durable list of RSS sources. Grounded on
//! `original_source/back/app/newsService/internal/storage/sources.go`.

use common::{AppError, ErrorKind};
use sqlx::{PgPool, Row};

use crate::models::Source;

pub struct SourceStore {
    pool: PgPool,
}

impl SourceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Source>, AppError> {
        let rows = sqlx::query("SELECT source_id, source_name, feed_url FROM sources ORDER BY source_id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't list sources: {e}")))?;

        if rows.is_empty() {
            return Err(AppError::new(ErrorKind::NoSources, "no sources configured"));
        }

        Ok(rows
            .into_iter()
            .map(|row| Source {
                id: row.get("source_id"),
                name: row.get("source_name"),
                feed_url: row.get("feed_url"),
            })
            .collect())
    }

    pub async fn get(&self, id: i64) -> Result<Source, AppError> {
        let row = sqlx::query("SELECT source_id, source_name, feed_url FROM sources WHERE source_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't look up source: {e}")))?;

        let row = row.ok_or_else(|| AppError::new(ErrorKind::SourceNotFound, "source not found"))?;
        Ok(Source {
            id: row.get("source_id"),
            name: row.get("source_name"),
            feed_url: row.get("feed_url"),
        })
    }

    pub async fn add(&self, name: &str, feed_url: &str) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO sources (source_name, feed_url) VALUES ($1, $2) RETURNING source_id",
        )
        .bind(name)
        .bind(feed_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::new(ErrorKind::SourceExists, "source already exists")
            }
            e => AppError::new(ErrorKind::Internal, format!("can't add source: {e}")),
        })
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sources WHERE source_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't delete source: {e}")))
    }
}
