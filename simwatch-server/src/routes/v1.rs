use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{auth, infra::state::AppState, ws};

/// Create all v1 API routes
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        // Public authentication endpoints
        .route("/auth/login", post(auth::handlers::login))
        // Merge protected routes
        .merge(create_protected_routes(state))
}

/// Create protected routes that require authentication
fn create_protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(auth::handlers::logout))
        .route("/auth/me", get(auth::handlers::me))
        .route(
            "/jobs/ws",
            axum::routing::any(ws::handler::jobs_ws_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::middleware::auth_middleware,
        ))
}
