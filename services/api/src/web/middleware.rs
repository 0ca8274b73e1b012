//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use feedback_coach_core::ports::PortError;
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Middleware that validates the bearer token and extracts the caller's claims.
///
/// If valid, inserts the `AuthenticatedUser` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| {
            PortError::Unauthorized("No valid authorization header".to_string())
        })?;

    let identity = state.auth.verify(token)?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
