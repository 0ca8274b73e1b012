//! services/api/src/web/documents.rs
//!
//! Document endpoints. Every handler runs behind `require_auth` and acts only on
//! documents owned by the authenticated user.

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection},
        FromRequestParts, Multipart, Path, State,
    },
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use feedback_coach_core::documents::NOT_FOUND;
use feedback_coach_core::domain::{AuthenticatedUser, Document, DocumentSummary};
use feedback_coach_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;

/// Name of the multipart part carrying the uploaded file.
const FILE_FIELD: &str = "file";

//=========================================================================================
// Path Extractor
//=========================================================================================

/// The `{id}` segment of a document route. An id that is not a UUID cannot
/// name any document, so it is rejected exactly like a missing one.
pub struct DocumentId(pub Uuid);

impl<S> FromRequestParts<S> for DocumentId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<Uuid>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => {
                debug!(reason = %rejection.body_text(), "Malformed document id");
                Err(PortError::NotFound(NOT_FOUND.to_string()).into())
            }
        }
    }
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub document_id: Uuid,
    pub filename: String,
}

#[derive(Serialize, ToSchema)]
pub struct DocumentSummaryResponse {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<DocumentSummary> for DocumentSummaryResponse {
    fn from(summary: DocumentSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title,
            created_at: summary.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            title: document.title,
            content: document.content,
            created_at: document.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct NextUntitledResponse {
    #[serde(rename = "nextNumber")]
    pub next_number: u64,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct FilenameCheckResponse {
    pub filename: String,
    pub exists: bool,
    pub message: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateContentRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Serialize, ToSchema)]
pub struct UpdateContentResponse {
    pub message: String,
    pub document_id: Uuid,
}

#[derive(Deserialize, ToSchema)]
pub struct RenameRequest {
    #[serde(default)]
    pub title: String,
}

#[derive(Serialize, ToSchema)]
pub struct RenameResponse {
    pub message: String,
    pub document_id: Uuid,
    pub new_title: String,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
    pub document_id: Uuid,
    pub deleted_title: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Upload a plain-text document.
///
/// Accepts a multipart/form-data request with a `file` part; the filename becomes
/// the document title.
#[utoipa::path(
    post,
    path = "/documents/upload",
    request_body(content_type = "multipart/form-data", description = "A UTF-8 `.txt` file (text/plain, at most 1 MiB) in the `file` part."),
    responses(
        (status = 201, description = "Document uploaded", body = UploadResponse),
        (status = 400, description = "Wrong type or extension, not UTF-8, too large, or duplicate title", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;

        let document_id = state
            .documents
            .upload(identity.user_id, &filename, content_type.as_deref(), &data)
            .await?;

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                message: "Document uploaded successfully".to_string(),
                document_id,
                filename,
            }),
        ));
    }

    Err(PortError::InvalidInput("Multipart form must include a file".to_string()).into())
}

/// List the caller's documents, newest first.
#[utoipa::path(
    get,
    path = "/documents/list",
    responses(
        (status = 200, description = "The caller's documents", body = [DocumentSummaryResponse]),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, ApiError> {
    let documents = state.documents.list(identity.user_id).await?;
    let body: Vec<DocumentSummaryResponse> = documents.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// The number to use for the next `Untitled N.txt` document.
#[utoipa::path(
    get,
    path = "/documents/get-next-untitled-number",
    responses(
        (status = 200, description = "Next free number", body = NextUntitledResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn next_untitled_number_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, ApiError> {
    let next_number = state.documents.next_untitled_number(identity.user_id).await?;
    Ok(Json(NextUntitledResponse {
        next_number,
        message: format!("Next available number is {}", next_number),
    }))
}

/// Whether the caller already has a document with this title.
#[utoipa::path(
    get,
    path = "/documents/check-filename/{filename}",
    params(("filename" = String, Path, description = "Title to check")),
    responses(
        (status = 200, description = "Availability of the title", body = FilenameCheckResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn check_filename_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    filename: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(filename) = filename?;
    let exists = state
        .documents
        .title_exists(identity.user_id, &filename)
        .await?;
    let message = if exists {
        "Filename already exists"
    } else {
        "Filename is available"
    };
    Ok(Json(FilenameCheckResponse {
        filename,
        exists,
        message: message.to_string(),
    }))
}

/// Fetch one of the caller's documents.
#[utoipa::path(
    get,
    path = "/documents/{id}",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 200, description = "The document", body = DocumentResponse),
        (status = 404, description = "Document not found or access denied", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    DocumentId(document_id): DocumentId,
) -> Result<impl IntoResponse, ApiError> {
    let document = state.documents.get(identity.user_id, document_id).await?;
    Ok(Json(DocumentResponse::from(document)))
}

/// Replace the content of one of the caller's documents.
#[utoipa::path(
    put,
    path = "/documents/{id}",
    params(("id" = Uuid, Path, description = "Document id")),
    request_body = UpdateContentRequest,
    responses(
        (status = 200, description = "Document updated", body = UpdateContentResponse),
        (status = 400, description = "Content exceeds 1 MiB", body = ErrorBody),
        (status = 404, description = "Document not found or access denied", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    DocumentId(document_id): DocumentId,
    payload: Result<Json<UpdateContentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    state
        .documents
        .update_content(identity.user_id, document_id, &req.content)
        .await?;
    Ok(Json(UpdateContentResponse {
        message: "Document updated successfully".to_string(),
        document_id,
    }))
}

/// Rename one of the caller's documents.
#[utoipa::path(
    put,
    path = "/documents/{id}/rename",
    params(("id" = Uuid, Path, description = "Document id")),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Document renamed", body = RenameResponse),
        (status = 400, description = "Empty or duplicate title", body = ErrorBody),
        (status = 404, description = "Document not found or access denied", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn rename_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    DocumentId(document_id): DocumentId,
    payload: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let new_title = state
        .documents
        .rename(identity.user_id, document_id, &req.title)
        .await?;
    Ok(Json(RenameResponse {
        message: "Document renamed successfully".to_string(),
        document_id,
        new_title,
    }))
}

/// Delete one of the caller's documents.
#[utoipa::path(
    delete,
    path = "/documents/{id}",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 200, description = "Document deleted", body = DeleteResponse),
        (status = 404, description = "Document not found or access denied", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "documents"
)]
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedUser>,
    DocumentId(document_id): DocumentId,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.documents.delete(identity.user_id, document_id).await?;
    Ok(Json(DeleteResponse {
        message: "Document deleted successfully".to_string(),
        document_id,
        deleted_title: deleted.title,
    }))
}
