use std::{net::SocketAddr, time::Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::USER_AGENT, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{loggers::dto::NewLogger, state::AppState};

const USER_ID_HEADER: &str = "x-user-id";
const FORWARDED_FOR: &str = "x-forwarded-for";

/// Records every request as an access-log row once the response is ready.
/// The write runs on its own task so the response is never held back.
pub async fn record_access(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if !state.config.access_log {
        return next.run(req).await;
    }

    let started = Instant::now();
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    let mut entry = NewLogger {
        user_id: header(req.headers(), USER_ID_HEADER),
        path: req.uri().path().to_owned(),
        params: req.uri().query().unwrap_or_default().to_owned(),
        method: req.method().to_string(),
        ip: client_ip(req.headers(), peer),
        agent: header(req.headers(), USER_AGENT.as_str()),
        ..Default::default()
    };

    let res = next.run(req).await;

    let elapsed = started.elapsed();
    entry.status = i32::from(res.status().as_u16());
    entry.latency = elapsed.as_secs_f64();
    entry.rtime = format!("{:.3}ms", elapsed.as_secs_f64() * 1000.0);

    let loggers = state.loggers.clone();
    tokio::spawn(async move {
        let path = entry.path.clone();
        if let Err(e) = loggers.add(entry).await {
            warn!(error = %e, %path, "access log write failed");
        }
    });

    res
}

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

/// First hop of `X-Forwarded-For`, else the socket peer.
fn client_ip(headers: &HeaderMap, peer: Option<String>) -> String {
    headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_owned())
        .filter(|ip| !ip.is_empty())
        .or(peer)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            FORWARDED_FOR,
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(
            client_ip(&headers, Some("10.0.0.2".into())),
            "203.0.113.7"
        );
    }

    #[test]
    fn client_ip_falls_back_to_peer() {
        let headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some("10.0.0.2".into())), "10.0.0.2");
        assert_eq!(client_ip(&headers, None), "");
    }
}
