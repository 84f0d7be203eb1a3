//! Axum route handlers for the resume.

use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use tracing::info;

use crate::auth::{ActiveSubscriber, AuthUser};
use crate::errors::AppError;
use crate::models::resume::{ResumeContent, ResumeRow};
use crate::resume::import::{extract_pdf_text, structure_resume, ImportedResume};
use crate::resume::pdf::render_resume_pdf_blocking;
use crate::resume::store::{get_resume, upsert_resume};
use crate::resume::{export_resume, ExportedResume, PDF_CONTENT_TYPE};
use crate::state::AppState;

/// Upload limit for resume imports.
pub const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;

async fn load_content(state: &AppState, user: &AuthUser) -> Result<ResumeContent, AppError> {
    get_resume(&state.db, user.user_id)
        .await?
        .map(ResumeRow::into_content)
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))
}

/// GET /api/v1/resume
pub async fn handle_get_resume(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ResumeRow>, AppError> {
    get_resume(&state.db, user.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))
}

/// PUT /api/v1/resume
pub async fn handle_put_resume(
    State(state): State<AppState>,
    user: AuthUser,
    Json(content): Json<ResumeContent>,
) -> Result<Json<ResumeRow>, AppError> {
    Ok(Json(upsert_resume(&state.db, user.user_id, &content).await?))
}

/// GET /api/v1/resume/pdf
pub async fn handle_resume_pdf(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let content = load_content(&state, &user).await?;
    let bytes = render_resume_pdf_blocking(content).await?;
    Ok((
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"resume.pdf\""),
        ],
        bytes,
    ))
}

/// POST /api/v1/resume/export
pub async fn handle_export_resume(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ExportedResume>, AppError> {
    let content = load_content(&state, &user).await?;
    let exported = export_resume(content, user.user_id, state.storage.as_ref()).await?;
    Ok(Json(exported))
}

/// POST /api/v1/resume/import
///
/// Multipart upload with a `file` field. Premium only, since it calls the chat provider.
pub async fn handle_import_resume(
    State(state): State<AppState>,
    ActiveSubscriber(user): ActiveSubscriber,
    mut multipart: Multipart,
) -> Result<Json<ImportedResume>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
            upload = Some(bytes);
            break;
        }
    }

    let bytes = upload.ok_or_else(|| AppError::Validation("Missing `file` field".to_string()))?;
    if !bytes.starts_with(b"%PDF") {
        return Err(AppError::Validation("Upload is not a PDF".to_string()));
    }
    info!("Resume import for user {}: {} bytes", user.user_id, bytes.len());

    let text = extract_pdf_text(bytes.to_vec()).await?;
    let imported = structure_resume(state.chat_llm.as_ref(), text).await?;
    Ok(Json(imported))
}
