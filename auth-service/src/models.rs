//! Domain types shared across auth-service's storage and service layers.

/// A registered user row, as read back from Postgres.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub pass_hash: String,
}

/// Bulk listing used to warm up the registration index on startup.
#[derive(Debug, Clone, Default)]
pub struct UsersInfo {
    pub names: Vec<String>,
    pub emails: Vec<String>,
}
