//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{get, get_service, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::account;
use super::websocket::{handler::ws_handler, state::AppState};

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = state.config.public_dir.clone();
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        // Pages
        .route("/", get_service(ServeFile::new(public.join("signup.html"))))
        .route("/signup", post(account::signup))
        .route(
            "/login",
            get_service(ServeFile::new(public.join("login.html"))).post(account::login),
        )
        .route("/chat", get_service(ServeFile::new(public.join("chat.html"))))
        // WebSocket endpoint
        .route("/ws", get(ws_handler))
        // Health check
        .route("/health", get(health_check))
        .route("/api/stats", get(relay_stats))
        .fallback_service(ServeDir::new(public))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Relay occupancy snapshot
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayStats {
    pub connections: usize,
    pub room_count: usize,
    pub rooms: Vec<String>,
}

/// GET /api/stats
async fn relay_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let hub = state.hub();
    Json(RelayStats {
        connections: hub.connection_count(),
        room_count: hub.room_count(),
        rooms: hub.room_names(),
    })
}
