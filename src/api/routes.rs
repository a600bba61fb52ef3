//! Router assembly and shared application state.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::storage::DbPool;

use super::handlers;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub pool: DbPool,
}

impl AppState {
    pub fn new(pool: DbPool, config: &AppConfig) -> Result<Self> {
        Ok(Self { auth: AuthService::with_sqlx(pool.clone(), config)?, pool })
    }
}

/// Build the application router with CORS and request tracing.
pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    let cors = cors_layer(&config.mail.frontend_url);

    Router::new()
        .route("/api/v1/auth/register", post(handlers::register))
        .route("/api/v1/auth/login", post(handlers::login))
        .route("/api/v1/auth/refresh", post(handlers::refresh))
        .route("/api/v1/auth/change-password", post(handlers::change_password))
        .route("/api/v1/auth/forgot-password", post(handlers::forgot_password))
        .route("/api/v1/auth/reset-password", post(handlers::reset_password))
        .route("/api/v1/users/me", get(handlers::me))
        .route("/api/v1/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match frontend_url.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            warn!(frontend_url = %frontend_url, "invalid FRONTEND_URL, CORS origin not set");
            layer
        }
    }
}
