// ABOUTME: Main entry point for the "É de Comer?" plant catalog API
// ABOUTME: Sets up config, tracing, database, routes and the upload directory

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing_subscriber::EnvFilter;

mod auth;
mod catalog;
mod config;
mod entities;
mod error;
mod geo;
mod migration;
mod moderation;
mod plants;
mod storage;
mod types;

#[cfg(test)]
mod storage_tests;

use auth::AuthState;
use config::Config;
use storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub auth: AuthState,
    pub config: Arc<Config>,
}

pub fn app(state: AppState) -> Router {
    // Room for the dados field plus a full set of maximum-size images.
    let body_limit = state.config.max_file_size * (state.config.max_files_per_registration + 1);

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/profile", get(auth::get_profile))
        .route("/auth/profile", put(auth::update_profile))
        .route("/plantas", get(plants::search))
        .route("/plantas", post(plants::create))
        .route("/plantas/proximas", get(plants::nearby))
        .route("/plantas/:id", get(plants::get_by_id))
        .route("/plantas/:id", put(plants::update))
        .route("/plantas/:id", delete(plants::delete))
        .route("/plantas/:id/avaliar", post(plants::rate))
        .route("/plantas/pendentes/listar", get(plants::list_pending))
        .route("/plantas/pendentes/:registroId/aprovar", put(plants::approve))
        .route("/plantas/pendentes/:registroId/rejeitar", put(plants::reject))
        .route("/plantas/pendentes/:registroId/analise", put(plants::mark_in_review))
        .nest_service(
            "/uploads",
            ServeDir::new(state.config.upload_dir.clone()),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Arc::new(Config::load());

    let storage = Arc::new(Storage::new(&config.database_url).await?);
    let auth = AuthState::new(&config.jwt_secret, config.jwt_expires_hours);

    tokio::fs::create_dir_all(format!("{}/plantas", config.upload_dir)).await?;

    let state = AppState {
        storage,
        auth,
        config: config.clone(),
    };

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("Servidor ouvindo em http://0.0.0.0:{}", config.port);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
