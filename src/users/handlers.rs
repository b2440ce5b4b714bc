use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    http::{query_params, reject, RowsAffected, Total},
    state::AppState,
    users::{
        dto::{NewUser, SigninRequest, UserPatch},
        repo_types::User,
    },
    util::page::Paged,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/signin", post(signin))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/count", get(count_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<SigninRequest>,
) -> Result<Json<User>, (StatusCode, String)> {
    let identifier = payload.identifier.trim();
    let user = state
        .users
        .signin(identifier, &payload.password)
        .await
        .map_err(reject)?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(raw): Query<HashMap<String, String>>,
) -> Result<Json<Paged<User>>, (StatusCode, String)> {
    let (items, page) = state
        .users
        .query(&query_params(raw))
        .await
        .map_err(reject)?;
    Ok(Json(Paged { items, page }))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), (StatusCode, String)> {
    let user = state.users.add(payload).await.map_err(reject)?;
    info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, (StatusCode, String)> {
    let user = state.users.one(id).await.map_err(reject)?;
    Ok(Json(user))
}

#[instrument(skip(state, patch))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<RowsAffected>, (StatusCode, String)> {
    let affected = state.users.update(id, patch).await.map_err(reject)?;
    Ok(Json(RowsAffected { affected }))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RowsAffected>, (StatusCode, String)> {
    let affected = state.users.delete(id).await.map_err(reject)?;
    Ok(Json(RowsAffected { affected }))
}

#[instrument(skip(state))]
pub async fn count_users(
    State(state): State<AppState>,
) -> Result<Json<Total>, (StatusCode, String)> {
    let total = state.users.count().await.map_err(reject)?;
    Ok(Json(Total { total }))
}
