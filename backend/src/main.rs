//! Main entry point for the Gard backend.
//!
//! This file initializes the Axum web server, sets up the database pool,
//! seeds the bootstrap superadmin and registers all API routes and
//! middleware.

mod api;
mod auth;
mod config;
mod database;
mod errors;
mod repositories;
mod services;
mod utils;

use std::sync::Arc;
use std::time::Duration;

use crate::api::common::ApiResponse;
use crate::auth::cookies::CookiePolicy;
use crate::repositories::revoked_token_repository::RevokedTokenRepository;
use crate::services::user_service::UserService;
use crate::utils::jwt::TokenManager;
use anyhow::Context;
use axum::{Extension, Router, response::Json, routing::get};
use config::Config;
use database::Database;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tracing::{error, info};
use tracing_subscriber::fmt::init;

const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();

    let config = Config::from_env()?;
    let db = Database::new(&config).await?;
    let pool = db.pool().clone();

    let tokens = Arc::new(
        TokenManager::from_config(&config).context("Invalid token configuration")?,
    );

    if let Some((email, password)) = config.first_superadmin() {
        let created = UserService::new(&pool)
            .ensure_superadmin(email, password)
            .await
            .context("Failed to seed the first superadmin")?;
        if !created {
            info!("Superadmin {} already exists", email);
        }
    }

    tokio::spawn(purge_revoked_tokens(pool.clone()));

    let app = build_router(
        pool,
        tokens,
        CookiePolicy::from_debug(config.debug),
        &config.api_v1_str,
    );

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    info!("Starting Gard server on port {}", config.server_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    Ok(())
}

fn build_router(
    pool: SqlitePool,
    tokens: Arc<TokenManager>,
    cookies: CookiePolicy,
    api_prefix: &str,
) -> Router {
    let api = Router::new()
        .route("/health", get(health_handler))
        .nest("/auth", auth::routes::auth_router())
        .nest("/tenants", api::tenant::routes::tenant_router())
        .nest("/users", api::user::routes::user_router());

    Router::new()
        .route("/", get(root_handler))
        .nest(api_prefix, api)
        .layer(Extension(cookies))
        .layer(Extension(tokens))
        .layer(Extension(pool))
}

async fn root_handler() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(
        json!({
            "service": "Gard Backend",
            "version": env!("CARGO_PKG_VERSION")
        }),
        "Welcome to Gard API",
    ))
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Drops revocation rows whose tokens have expired on their own.
async fn purge_revoked_tokens(pool: SqlitePool) {
    let mut interval = tokio::time::interval(PURGE_INTERVAL);
    loop {
        interval.tick().await;
        match RevokedTokenRepository::new(&pool)
            .purge_expired(chrono::Utc::now())
            .await
        {
            Ok(0) => {}
            Ok(purged) => info!("Purged {} expired revoked tokens", purged),
            Err(e) => error!("Failed to purge revoked tokens: {}", e),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
