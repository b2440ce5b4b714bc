use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// One HTTP access-log record.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Logger {
    pub id: i64,
    pub user_id: String,
    pub path: String,
    pub params: String, // raw query string
    pub method: String,
    pub ip: String,
    pub latency: f64, // seconds
    pub agent: String,
    pub status: i32,
    pub rtime: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Default, Clone)]
pub struct LoggerFilter {
    pub path: Option<String>,
}
