//! Fast existence checks for emails and user names, backed by two Redis sets.
//!
//! Exists purely to answer `/check/email` and `/check/user_name` without touching Postgres on
//! every keystroke of a signup form. Warmed up from the `users` table on startup so a restart
//! doesn't return false negatives until the index fills back in.

use common::{AppError, ErrorKind};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::models::UsersInfo;

const EMAILS_KEY: &str = "auth:registered_emails";
const USER_NAMES_KEY: &str = "auth:registered_user_names";

pub struct RegistrationIndex {
    conn: ConnectionManager,
}

impl RegistrationIndex {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    pub async fn check_email(&self, email: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        conn.sismember(EMAILS_KEY, email)
            .await
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't check email: {e}")))
    }

    pub async fn check_user_name(&self, user_name: &str) -> Result<bool, AppError> {
        let mut conn = self.conn.clone();
        conn.sismember(USER_NAMES_KEY, user_name)
            .await
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't check user name: {e}")))
    }

    /// Record a freshly saved user. Best-effort: if the second SADD fails, the first is rolled
    /// back so the index doesn't end up claiming a user name exists with no matching email.
    pub async fn save_user(&self, user_name: &str, email: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();

        let added_name: redis::RedisResult<()> = conn.sadd(USER_NAMES_KEY, user_name).await;
        if let Err(e) = added_name {
            return Err(AppError::new(ErrorKind::Internal, format!("can't index user name: {e}")));
        }

        if let Err(e) = conn.sadd::<_, _, ()>(EMAILS_KEY, email).await {
            let _: redis::RedisResult<()> = conn.srem(USER_NAMES_KEY, user_name).await;
            return Err(AppError::new(ErrorKind::Internal, format!("can't index email: {e}")));
        }

        Ok(())
    }

    pub async fn delete_user(&self, user_name: &str, email: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.srem::<_, _, ()>(USER_NAMES_KEY, user_name)
            .await
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't remove user name: {e}")))?;
        conn.srem::<_, _, ()>(EMAILS_KEY, email)
            .await
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't remove email: {e}")))
    }

    /// Bulk-load every known name/email pair. Called once at startup with the result of
    /// `UserStorage::get_info`.
    pub async fn warm_up(&self, info: &UsersInfo) -> Result<(), AppError> {
        if info.names.is_empty() && info.emails.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.clone();
        if !info.names.is_empty() {
            conn.sadd::<_, _, ()>(USER_NAMES_KEY, &info.names)
                .await
                .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't warm up user names: {e}")))?;
        }
        if !info.emails.is_empty() {
            conn.sadd::<_, _, ()>(EMAILS_KEY, &info.emails)
                .await
                .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't warm up emails: {e}")))?;
        }
        Ok(())
    }
}
