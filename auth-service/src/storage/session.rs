//! Redis-backed refresh-token sessions, one key per user id.

use common::{AppError, ErrorKind};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

pub struct SessionStorage {
    conn: ConnectionManager,
    expire_secs: Option<u64>,
}

impl SessionStorage {
    pub async fn connect(url: &str, expire_secs: Option<u64>) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn, expire_secs })
    }

    pub async fn set_session(&self, user_id: i64, refresh_token: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        let key = user_id.to_string();

        let result: redis::RedisResult<()> = match self.expire_secs {
            Some(secs) => conn.set_ex(&key, refresh_token, secs).await,
            None => conn.set(&key, refresh_token).await,
        };

        result.map_err(|e| AppError::new(ErrorKind::Internal, format!("can't set session: {e}")))
    }

    pub async fn get_session_token(&self, user_id: i64) -> Result<String, AppError> {
        let mut conn = self.conn.clone();
        let key = user_id.to_string();

        let value: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't get session: {e}")))?;

        value.ok_or_else(|| AppError::new(ErrorKind::SessionNotFound, "session not found"))
    }
}
