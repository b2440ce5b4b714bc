use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub nickname: String,
    pub email: String,
    pub phone: String,
    pub sex: String,
    #[serde(skip_serializing)]
    pub password: String, // salted hash, not exposed in JSON
    #[serde(skip_serializing)]
    pub salt: String,
    pub score: i64,
    pub status: String,
    pub avatar: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Identifying keys used to find a single user; empty keys never match.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserLookup<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
}

impl UserLookup<'_> {
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.email.is_empty() && self.phone.is_empty()
    }
}

/// Substring filters for listing users.
#[derive(Debug, Default, Clone)]
pub struct UserFilter {
    pub username: Option<String>,
    pub phone: Option<String>,
}
