use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewLogger {
    pub user_id: String,
    pub path: String,
    pub params: String,
    pub method: String,
    pub ip: String,
    pub latency: f64,
    pub agent: String,
    pub status: i32,
    pub rtime: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggerPatch {
    pub user_id: Option<String>,
    pub path: Option<String>,
    pub params: Option<String>,
    pub method: Option<String>,
    pub ip: Option<String>,
    pub latency: Option<f64>,
    pub agent: Option<String>,
    pub status: Option<i32>,
    pub rtime: Option<String>,
}
