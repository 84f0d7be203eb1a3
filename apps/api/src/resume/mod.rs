//! Resume records: CRUD, PDF export to object storage, and PDF import.

pub mod handlers;
pub mod import;
pub mod metrics;
pub mod pdf;
pub mod prompts;
pub mod store;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeContent;
use crate::resume::pdf::render_resume_pdf_blocking;
use crate::storage::ObjectStorage;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, Serialize)]
pub struct ExportedResume {
    pub key: String,
    pub url: String,
    pub size_bytes: usize,
}

/// Object key for a new export. Every export gets a fresh key.
pub fn export_key(user_id: Uuid) -> String {
    format!("resumes/{user_id}/{}.pdf", Uuid::new_v4())
}

/// Renders `content` and stores the PDF, returning where it can be downloaded.
pub async fn export_resume(
    content: ResumeContent,
    user_id: Uuid,
    storage: &dyn ObjectStorage,
) -> Result<ExportedResume, AppError> {
    let bytes = render_resume_pdf_blocking(content).await?;
    let size_bytes = bytes.len();
    let key = export_key(user_id);
    storage.put(&key, bytes, PDF_CONTENT_TYPE).await?;
    info!("Exported resume for user {user_id}: {key} ({size_bytes} bytes)");

    Ok(ExportedResume {
        url: storage.public_url(&key),
        key,
        size_bytes,
    })
}
