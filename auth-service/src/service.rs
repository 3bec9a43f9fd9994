//! Core signup/login/token logic, independent of the gRPC transport.

use std::sync::Arc;

use common::{AppError, ErrorKind};
use tracing::{error, warn};

use crate::storage::{RegistrationIndex, SessionStorage, UserStorage};
use crate::token::{TokenError, TokenManager};
use once_email::is_plausible_email;

pub struct AuthCore {
    users: Arc<UserStorage>,
    sessions: Arc<SessionStorage>,
    registration_index: Arc<RegistrationIndex>,
    tokens: TokenManager,
}

pub struct LoggedIn {
    pub user_id: i64,
    pub user_name: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl AuthCore {
    pub fn new(
        users: Arc<UserStorage>,
        sessions: Arc<SessionStorage>,
        registration_index: Arc<RegistrationIndex>,
        tokens: TokenManager,
    ) -> Self {
        Self {
            users,
            sessions,
            registration_index,
            tokens,
        }
    }

    pub async fn save_user(&self, user_name: &str, email: &str, password: &str) -> Result<i64, AppError> {
        validate_for_save(user_name, email, password)?;

        let pass_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't hash password: {e}")))?;

        let id = self.users.save_user(user_name, email, &pass_hash).await?;

        if let Err(e) = self.registration_index.save_user(user_name, email).await {
            warn!(%e, "failed to update registration index after signup");
        }

        Ok(id)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<LoggedIn, AppError> {
        validate_for_login(email, password)?;

        let user = self.users.get_user_by_email(email).await?;

        let matches = bcrypt::verify(password, &user.pass_hash)
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't verify password: {e}")))?;
        if !matches {
            warn!(%email, "password mismatch on login");
            return Err(AppError::new(ErrorKind::UserDoesntExists, "wrong email or password"));
        }

        let (access_token, refresh_token) = self
            .tokens
            .create_tokens(user.id, &user.name)
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't create tokens: {e}")))?;

        self.sessions.set_session(user.id, &refresh_token).await?;

        Ok(LoggedIn {
            user_id: user.id,
            user_name: user.name,
            access_token,
            refresh_token,
        })
    }

    /// Verify an access token carried in the `Authorization: Bearer <token>` header.
    pub fn parse(&self, auth_header: &str) -> Result<(i64, String), AppError> {
        let token = token_from_header(auth_header)
            .map_err(|e| AppError::new(ErrorKind::InvalidToken, e))?;

        self.tokens.parse(&token).map_err(|e| match e {
            TokenError::Expired => AppError::new(ErrorKind::TokenExpired, "token expired"),
            TokenError::Invalid(msg) => AppError::new(ErrorKind::InvalidToken, msg),
        })
    }

    /// Issue a new token pair from a still-valid refresh token, rotating the stored session.
    ///
    /// An *expired* refresh token maps to `SessionNotFound` rather than `TokenExpired` — the
    /// caller can no longer recover without logging in again either way, and collapsing the two
    /// keeps the gateway's refresh-or-fall-through logic to a single branch.
    pub async fn refresh(&self, refresh_token: &str) -> Result<LoggedIn, AppError> {
        let (user_id, user_name) = self.tokens.parse(refresh_token).map_err(|e| match e {
            TokenError::Expired => AppError::new(ErrorKind::SessionNotFound, "refresh token expired"),
            TokenError::Invalid(msg) => AppError::new(ErrorKind::InvalidToken, msg),
        })?;

        let stored = self.sessions.get_session_token(user_id).await?;

        if stored != refresh_token {
            error!(user_id, "stored refresh token does not match presented token");
            return Err(AppError::new(ErrorKind::InvalidToken, "refresh token mismatch"));
        }

        let (access_token, new_refresh_token) = self
            .tokens
            .create_tokens(user_id, &user_name)
            .map_err(|e| AppError::new(ErrorKind::Internal, format!("can't create tokens: {e}")))?;

        self.sessions.set_session(user_id, &new_refresh_token).await?;

        Ok(LoggedIn {
            user_id,
            user_name,
            access_token,
            refresh_token: new_refresh_token,
        })
    }
}

fn validate_for_save(user_name: &str, email: &str, password: &str) -> Result<(), AppError> {
    if !is_plausible_email(email) {
        return Err(AppError::new(ErrorKind::InvalidValue, "invalid email"));
    }
    if user_name.is_empty() {
        return Err(AppError::new(ErrorKind::InvalidValue, "user name is required"));
    }
    if password.is_empty() {
        return Err(AppError::new(ErrorKind::InvalidValue, "password is required"));
    }
    Ok(())
}

fn validate_for_login(email: &str, password: &str) -> Result<(), AppError> {
    if !is_plausible_email(email) {
        return Err(AppError::new(ErrorKind::InvalidValue, "invalid email"));
    }
    if password.is_empty() {
        return Err(AppError::new(ErrorKind::InvalidValue, "password is required"));
    }
    Ok(())
}

fn token_from_header(header: &str) -> Result<String, String> {
    if header.is_empty() {
        return Err("empty auth header".to_string());
    }

    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default();

    if scheme != "Bearer" || token.is_empty() {
        return Err("invalid auth header".to_string());
    }

    Ok(token.to_string())
}

/// A tiny, dependency-free email shape check mirroring the permissiveness of the upstream
/// validator this was ported from: one `@`, something on both sides, a dot somewhere after it.
mod once_email {
    pub fn is_plausible_email(value: &str) -> bool {
        let Some((local, domain)) = value.split_once('@') else {
            return false;
        };
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_from_header_accepts_bearer() {
        assert_eq!(token_from_header("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
    }

    #[test]
    fn token_from_header_rejects_missing_scheme() {
        assert!(token_from_header("abc.def.ghi").is_err());
        assert!(token_from_header("").is_err());
        assert!(token_from_header("Bearer ").is_err());
    }

    #[test]
    fn email_shape_check() {
        assert!(once_email::is_plausible_email("a@b.com"));
        assert!(!once_email::is_plausible_email("a@b"));
        assert!(!once_email::is_plausible_email("ab.com"));
        assert!(!once_email::is_plausible_email("@b.com"));
    }
}
