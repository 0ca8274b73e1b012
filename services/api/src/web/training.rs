//! services/api/src/web/training.rs
//!
//! Submission of anonymized correction/feedback triples.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;

// Missing fields deserialize as empty so they get the service's own message.
#[derive(Deserialize, ToSchema)]
pub struct TrainingDataRequest {
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub teacher_correction: String,
    #[serde(default)]
    pub cbc_feedback: String,
}

#[derive(Serialize, ToSchema)]
pub struct TrainingDataResponse {
    pub message: String,
    pub training_data_id: Uuid,
    pub submitted_at: DateTime<Utc>,
}

/// Store a teacher's correction and feedback for model training.
///
/// The caller must be authenticated, but nothing identifying them is stored.
#[utoipa::path(
    post,
    path = "/documents/submit-training-data",
    request_body = TrainingDataRequest,
    responses(
        (status = 200, description = "Sample stored", body = TrainingDataResponse),
        (status = 400, description = "A field is empty", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "training"
)]
pub async fn submit_training_data_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TrainingDataRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let sample = state
        .training
        .submit(&req.original_text, &req.teacher_correction, &req.cbc_feedback)
        .await?;

    Ok(Json(TrainingDataResponse {
        message: "Training data submitted successfully".to_string(),
        training_data_id: sample.id,
        submitted_at: sample.submitted_at,
    }))
}
