use anyhow::Context;
use serde::Deserialize;

const DEFAULT_LOG_FILTER: &str = "userlog=debug,axum=info,tower_http=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Subscriber settings from `RUST_LOG` and `LOG_FORMAT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("RUST_LOG").ok(),
            std::env::var("LOG_FORMAT").ok(),
        )
    }

    fn from_vars(filter: Option<String>, format: Option<String>) -> Self {
        let filter = filter
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        let format = match format.as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        Self { filter, format }
    }
}

pub fn init_tracing(settings: &LogSettings) {
    let builder = tracing_subscriber::fmt().with_env_filter(settings.filter.as_str());
    match settings.format {
        LogFormat::Json => builder.with_target(false).json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    /// Record every handled request in the `loggers` table.
    pub access_log: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let db_max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);
        let access_log = std::env::var("ACCESS_LOG")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no"))
            .unwrap_or(true);
        Ok(Self {
            database_url,
            db_max_connections,
            host,
            port,
            access_log,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_settings_default_to_text_with_crate_filter() {
        let s = LogSettings::from_vars(None, None);
        assert_eq!(s.filter, DEFAULT_LOG_FILTER);
        assert_eq!(s.format, LogFormat::Text);

        let s = LogSettings::from_vars(Some("  ".into()), Some("pretty".into()));
        assert_eq!(s.filter, DEFAULT_LOG_FILTER);
        assert_eq!(s.format, LogFormat::Text);
    }

    #[test]
    fn log_settings_honour_env_values() {
        let s = LogSettings::from_vars(Some("userlog=trace".into()), Some("JSON".into()));
        assert_eq!(s.filter, "userlog=trace");
        assert_eq!(s.format, LogFormat::Json);
    }
}
