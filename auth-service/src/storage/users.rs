//! Postgres-backed user records.

use common::{AppError, ErrorKind};
use sqlx::{PgPool, Row};

use crate::models::{User, UsersInfo};

pub struct UserStorage {
    pool: PgPool,
}

impl UserStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn save_user(&self, user_name: &str, email: &str, pass_hash: &str) -> Result<i64, AppError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (user_name, email, password_hash) VALUES ($1, $2, $3)
             ON CONFLICT DO NOTHING RETURNING user_id",
        )
        .bind(user_name)
        .bind(email)
        .bind(pass_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't insert user: {e}")))?;

        row.ok_or_else(|| AppError::new(ErrorKind::UserExists, "user already exists"))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User, AppError> {
        let row = sqlx::query("SELECT user_id, user_name, email, password_hash FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't get user: {e}")))?;

        let row = row.ok_or_else(|| AppError::new(ErrorKind::UserDoesntExists, "user not found"))?;

        Ok(User {
            id: row.get("user_id"),
            name: row.get("user_name"),
            email: row.get("email"),
            pass_hash: row.get("password_hash"),
        })
    }

    /// Every registered user's name and email, used to warm up the registration index.
    pub async fn get_info(&self) -> Result<UsersInfo, AppError> {
        let rows = sqlx::query("SELECT user_name, email FROM users WHERE user_id > 1")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't list users: {e}")))?;

        let mut info = UsersInfo::default();
        for row in rows {
            info.names.push(row.get("user_name"));
            info.emails.push(row.get("email"));
        }
        Ok(info)
    }
}
