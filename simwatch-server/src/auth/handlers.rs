use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use simwatch_core::OperatorIdentity;

use crate::infra::{
    errors::{AppError, AppResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    // One generic message for unknown users and bad passwords
    if !state.operators.verify(&request.username, &request.password) {
        return Err(AppError::unauthorized("invalid username or password"));
    }

    let issued = state.tokens.issue(&request.username)?;
    info!(username = %issued.identity.username, "operator logged in");

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer",
        expires_at: issued.identity.expires_at,
        username: issued.identity.username,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(identity): Extension<OperatorIdentity>,
) -> StatusCode {
    state.tokens.revoke(&identity);
    info!(username = %identity.username, "operator logged out");
    StatusCode::NO_CONTENT
}

pub async fn me(Extension(identity): Extension<OperatorIdentity>) -> Json<MeResponse> {
    Json(MeResponse {
        username: identity.username,
        expires_at: identity.expires_at,
    })
}
