use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    http::{query_params, reject, RowsAffected, Total},
    loggers::{
        dto::{LoggerPatch, NewLogger},
        repo_types::Logger,
    },
    state::AppState,
    util::page::Paged,
};

pub fn logger_routes() -> Router<AppState> {
    Router::new()
        .route("/loggers", get(list_loggers).post(create_logger))
        .route("/loggers/count", get(count_loggers))
        .route(
            "/loggers/:id",
            get(get_logger).put(update_logger).delete(delete_logger),
        )
}

#[instrument(skip(state))]
pub async fn list_loggers(
    State(state): State<AppState>,
    Query(raw): Query<HashMap<String, String>>,
) -> Result<Json<Paged<Logger>>, (StatusCode, String)> {
    let (items, page) = state
        .loggers
        .query(&query_params(raw))
        .await
        .map_err(reject)?;
    Ok(Json(Paged { items, page }))
}

#[instrument(skip(state, payload))]
pub async fn create_logger(
    State(state): State<AppState>,
    Json(payload): Json<NewLogger>,
) -> Result<(StatusCode, Json<Logger>), (StatusCode, String)> {
    let entry = state.loggers.add(payload).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn get_logger(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Logger>, (StatusCode, String)> {
    let entry = state.loggers.one(id).await.map_err(reject)?;
    Ok(Json(entry))
}

#[instrument(skip(state, patch))]
pub async fn update_logger(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<LoggerPatch>,
) -> Result<Json<RowsAffected>, (StatusCode, String)> {
    let affected = state.loggers.update(id, patch).await.map_err(reject)?;
    Ok(Json(RowsAffected { affected }))
}

#[instrument(skip(state))]
pub async fn delete_logger(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RowsAffected>, (StatusCode, String)> {
    let affected = state.loggers.delete(id).await.map_err(reject)?;
    Ok(Json(RowsAffected { affected }))
}

#[instrument(skip(state))]
pub async fn count_loggers(
    State(state): State<AppState>,
) -> Result<Json<Total>, (StatusCode, String)> {
    let total = state.loggers.count().await.map_err(reject)?;
    Ok(Json(Total { total }))
}
