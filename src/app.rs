use std::{net::SocketAddr, time::Duration};

use axum::{
    http::{Request, Response},
    middleware,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{field::Empty, Span};

use crate::config::AppConfig;
use crate::loggers::middleware::record_access;
use crate::state::AppState;
use crate::{loggers, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(users::router())
                .merge(loggers::router())
                .route("/health", get(|| async { "ok" })),
        )
        .layer(middleware::from_fn_with_state(state.clone(), record_access))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        path = req.uri().path(),
                        status = Empty,
                        latency_ms = Empty
                    )
                })
                .on_response(|res: &Response<_>, latency: Duration, span: &Span| {
                    let status = res.status().as_u16();
                    span.record("status", status);
                    span.record("latency_ms", latency.as_millis() as u64);
                    if status >= 500 {
                        tracing::error!(status, "request failed");
                    } else if status >= 400 {
                        tracing::warn!(status, "request rejected");
                    } else {
                        tracing::debug!(status, "request handled");
                    }
                }),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = config.bind_addr().parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
