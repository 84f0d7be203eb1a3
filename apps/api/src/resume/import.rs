//! Turns an uploaded PDF resume into a draft `ResumeContent`.

use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::{parse_structured, ChatTurn, CompletionProvider, CompletionRequest, ParsedReply};
use crate::models::resume::ResumeContent;
use crate::resume::prompts::{MAX_IMPORT_CHARS, RESUME_IMPORT_SYSTEM};

/// Result of an import. Not persisted; the client reviews it before saving.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ImportedResume {
    Draft { resume: ResumeContent, model: &'static str },
    /// The model's reply was unusable; the extracted text is returned as-is.
    Raw { raw_text: String },
}

/// Extracts the text layer of a PDF on the blocking pool.
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String, AppError> {
    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF extract: {e}")))?;

    let text = extracted.map_err(|e| {
        warn!("PDF text extraction failed: {e}");
        AppError::Validation("Could not read text from the uploaded PDF".to_string())
    })?;
    let text = normalize_whitespace(&text);
    if text.is_empty() {
        return Err(AppError::Validation(
            "The uploaded PDF has no extractable text".to_string(),
        ));
    }
    debug!("Extracted {} characters from uploaded PDF", text.len());
    Ok(text)
}

/// Collapses runs of blank lines and trailing spaces left by PDF extraction.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = Vec::new();
    let mut blank_run = 0;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line);
    }
    out.join("\n").trim().to_string()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Asks the chat provider to structure resume text. Falls back to the raw text.
pub async fn structure_resume(
    provider: &dyn CompletionProvider,
    text: String,
) -> Result<ImportedResume, AppError> {
    let system = system_prompt(RESUME_IMPORT_SYSTEM, true);
    let turns = [ChatTurn::user(truncate_chars(&text, MAX_IMPORT_CHARS))];
    let completion = provider
        .complete(CompletionRequest {
            system: &system,
            turns: &turns,
            json_output: true,
        })
        .await
        .map_err(|e| AppError::Llm(format!("resume import call failed: {e}")))?;

    let draft = match parse_structured(&completion.text) {
        ParsedReply::Json(value) => serde_json::from_value::<ResumeContent>(value).ok(),
        ParsedReply::Text(_) => None,
    };

    Ok(match draft {
        Some(resume) => ImportedResume::Draft {
            resume,
            model: completion.model,
        },
        None => {
            warn!("Resume import reply was not usable JSON; returning extracted text");
            ImportedResume::Raw { raw_text: text }
        }
    })
}
