//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and account lookup.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use feedback_coach_core::domain::AuthenticatedUser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;

/// Where the browser client goes after a successful login.
const DASHBOARD_URL: &str = "/dashboard";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct SignupResponse {
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub redirect_url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct UserDataResponse {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "User created successfully", body = SignupResponse),
        (status = 400, description = "Email already registered, weak password or malformed email", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let user_id = state
        .auth
        .signup(&req.email, &req.password, &req.first_name, &req.last_name)
        .await?;

    Ok(Json(SignupResponse {
        message: "User created successfully".to_string(),
        user_id,
    }))
}

/// POST /auth/login - Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let issued = state.auth.login(&req.email, &req.password).await?;

    Ok(Json(LoginResponse {
        access_token: issued.token,
        token_type: "bearer".to_string(),
        redirect_url: DASHBOARD_URL.to_string(),
        expires_at: issued.expires_at,
    }))
}

/// GET /auth/user-data - The account behind the presented token
#[utoipa::path(
    get,
    path = "/auth/user-data",
    responses(
        (status = 200, description = "Current user", body = UserDataResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "User no longer exists", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn user_data_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth.current_user(&identity).await?;

    Ok(Json(UserDataResponse {
        user_id: user.id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
    }))
}
