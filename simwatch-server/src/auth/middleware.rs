use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use simwatch_core::AuthOutcome;

use crate::infra::{errors::AppError, state::AppState};

/// Gate for protected routes: resolves the bearer token and exposes the
/// operator to handlers as a request extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = bearer_token(&request);

    let identity = match state.tokens.resolve(bearer.as_deref()) {
        AuthOutcome::Ok(identity) => identity,
        AuthOutcome::Missing => return Err(AppError::unauthorized("missing credentials")),
        AuthOutcome::Expired => return Err(AppError::unauthorized("token expired")),
        // Revoked is deliberately indistinguishable from invalid
        AuthOutcome::Invalid | AuthOutcome::Revoked => {
            return Err(AppError::unauthorized("invalid token"));
        }
    };

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<String> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?;

    auth_header
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}
