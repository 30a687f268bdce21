//! # Simwatch Server
//!
//! Administrative backend for launching and watching simulation jobs.
//!
//! ## Overview
//!
//! The server exposes:
//!
//! - **Operator authentication**: signed bearer tokens with server-side
//!   revocation on logout
//! - **Job launching**: one external long-running job per WebSocket session
//! - **Log relay**: console output of running jobs streamed line by line to
//!   the session that started them
//!
//! Built on Axum; all state is in-process (no database).

pub mod auth;
pub mod infra;
pub mod routes;
pub mod ws;

pub use infra::{config::Config, state::AppState};

use axum::{Json, Router, extract::State, http::HeaderValue, routing::get};
use serde_json::{Value, json};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

/// Assemble the full application router around shared state.
pub fn create_app(state: AppState) -> Router {
    // Build CORS layer (permissive in dev, allow-list otherwise)
    let cors_layer = if state.config.dev_mode {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect();
        let allow_origin = if origins.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(origins)
        };
        CorsLayer::new().allow_origin(allow_origin)
    };

    Router::new()
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler))
        // Add versioned API routes
        .merge(routes::create_api_router(state.clone()))
        // Middleware layers, outer to inner: CORS, then request tracing
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ping_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "pong",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "active_jobs": state.supervisor.active_jobs(),
            "connected_sessions": state.sessions.connected(),
            "operators": state.operators.len(),
        }
    }))
}
