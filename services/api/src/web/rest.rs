//! services/api/src/web/rest.rs
//!
//! Contains the REST router and the master definition for the OpenAPI
//! specification.

use crate::error::ErrorBody;
use crate::web::{auth, documents, middleware::require_auth, state::AppState, training};
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

/// Request bodies larger than this are refused by the framework. It sits well
/// above the 1 MiB document limit so the service reports oversize documents itself.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::user_data_handler,
        documents::upload_handler,
        documents::list_handler,
        documents::next_untitled_number_handler,
        documents::check_filename_handler,
        documents::get_handler,
        documents::update_handler,
        documents::rename_handler,
        documents::delete_handler,
        training::submit_training_data_handler,
    ),
    components(
        schemas(
            ErrorBody,
            HealthResponse,
            auth::SignupRequest,
            auth::SignupResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserDataResponse,
            documents::UploadResponse,
            documents::DocumentSummaryResponse,
            documents::DocumentResponse,
            documents::NextUntitledResponse,
            documents::FilenameCheckResponse,
            documents::UpdateContentRequest,
            documents::UpdateContentResponse,
            documents::RenameRequest,
            documents::RenameResponse,
            documents::DeleteResponse,
            training::TrainingDataRequest,
            training::TrainingDataResponse,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "CBC Feedback Coach API", description = "Accounts, teacher documents and training data collection.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by protected paths.
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

//=========================================================================================
// Router
//=========================================================================================

/// Builds the API router: public auth routes plus the bearer-protected routes.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/user-data", get(auth::user_data_handler))
        .route("/documents/upload", post(documents::upload_handler))
        .route("/documents/list", get(documents::list_handler))
        .route(
            "/documents/get-next-untitled-number",
            get(documents::next_untitled_number_handler),
        )
        .route(
            "/documents/check-filename/{filename}",
            get(documents::check_filename_handler),
        )
        .route(
            "/documents/submit-training-data",
            post(training::submit_training_data_handler),
        )
        .route(
            "/documents/{id}",
            get(documents::get_handler)
                .put(documents::update_handler)
                .delete(documents::delete_handler),
        )
        .route("/documents/{id}/rename", put(documents::rename_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(app_state)
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_endpoint() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/signup",
            "/auth/login",
            "/auth/user-data",
            "/documents/upload",
            "/documents/list",
            "/documents/get-next-untitled-number",
            "/documents/check-filename/{filename}",
            "/documents/{id}",
            "/documents/{id}/rename",
            "/documents/submit-training-data",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer"));
    }
}
