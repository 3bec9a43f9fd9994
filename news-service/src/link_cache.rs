//! Content-addressed set of already-seen article URLs, used for ingestion dedup.
//!
//! Grounded on `original_source/back/app/newsService/internal/storage/redis/redis.go`'s
//! `SetLink`/`DeleteLink`: a single `SET key val NX` gives atomic set-if-absent with no
//! read-then-write race, and there is intentionally no TTL (see DESIGN.md's Open Question
//! decision — eviction is an external policy, not this crate's concern).

use common::{AppError, ErrorKind};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use sha1::{Digest, Sha1};

pub struct LinkCache {
    conn: ConnectionManager,
}

impl LinkCache {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    /// Lowercase hex SHA-1 digest of the link's raw bytes.
    pub fn hash(link: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(link.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Atomic compare-and-set: exactly one concurrent caller for a given hash observes `Ok(())`,
    /// every other caller observes `ErrLinkExists`.
    pub async fn set_if_absent(&self, hash: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let set: bool = conn
            .set_nx(hash, "1")
            .await
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't write link cache: {e}")))?;

        if set {
            Ok(())
        } else {
            Err(AppError::new(ErrorKind::LinkExists, "link already seen"))
        }
    }

    pub async fn delete(&self, hash: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(hash)
            .await
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't evict link cache entry: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_lowercase_hex() {
        let h1 = LinkCache::hash("https://example.com/a");
        let h2 = LinkCache::hash("https://example.com/a");
        let h3 = LinkCache::hash("https://example.com/b");
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1.len(), 40);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
