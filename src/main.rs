use std::sync::Arc;

mod app;
mod config;
mod db;
mod error;
mod http;
mod loggers;
mod state;
mod users;
mod util;

use crate::{
    config::{AppConfig, LogSettings},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    config::init_tracing(&LogSettings::from_env());

    let config = Arc::new(AppConfig::from_env()?);
    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;

    let app_state = AppState::from_pool(pool, config.clone());
    let app = app::build_app(app_state);
    app::serve(app, &config).await
}
