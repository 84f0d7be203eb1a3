/// LLM Client — the single point of entry for all completion API calls in CareerVision.
///
/// ARCHITECTURAL RULE: No other module may call an AI provider directly.
/// Handlers pick a provider through `AppState` and talk to it via `CompletionProvider`.
///
/// Two providers are integrated: OpenAI chat completions (`openai`) and
/// Google Gemini generateContent (`gemini`). Model names are hardcoded per provider.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod gemini;
pub mod openai;
pub mod prompts;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a conversation sent to a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Provider-neutral completion request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    /// Conversation so far; the last turn is the user's current message.
    pub turns: &'a [ChatTurn],
    /// Ask the provider for JSON output where it supports a JSON mode.
    pub json_output: bool,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub model: &'static str,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A completion backend. Carried in `AppState` as `Arc<dyn CompletionProvider>`.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn model(&self) -> &'static str;

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion, LlmError>;
}

/// Outcome of reading a reply that was supposed to be JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedReply {
    Json(Value),
    /// The model did not return usable JSON; the text is passed through untouched.
    Text(String),
}

/// Parses a model reply as a JSON object or array, falling back to the raw text.
///
/// Tolerates markdown fences and prose around the payload. Never fails.
pub fn parse_structured(text: &str) -> ParsedReply {
    let stripped = strip_json_fences(text);
    if let Some(value) = parse_container(stripped) {
        return ParsedReply::Json(value);
    }
    if let Some(value) = extract_embedded(stripped).and_then(parse_container) {
        return ParsedReply::Json(value);
    }
    ParsedReply::Text(text.trim().to_string())
}

fn parse_container(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(v @ (Value::Object(_) | Value::Array(_))) => Some(v),
        _ => None,
    }
}

/// Slices from the first `{`/`[` to the last matching closer.
fn extract_embedded(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Pulls `error.message` out of a provider error body, if it has one.
pub(crate) fn api_error_message(body: String) -> String {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorBody,
    }
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_parse_structured_fenced_object() {
        let reply = parse_structured("```json\n{\"steps\": [1, 2]}\n```");
        assert_eq!(reply, ParsedReply::Json(json!({"steps": [1, 2]})));
    }

    #[test]
    fn test_parse_structured_object_inside_prose() {
        let reply = parse_structured("Sure! Here you go: {\"role\": \"SRE\"} Hope it helps.");
        assert_eq!(reply, ParsedReply::Json(json!({"role": "SRE"})));
    }

    #[test]
    fn test_parse_structured_top_level_array() {
        let reply = parse_structured("[{\"skill\": \"Rust\"}]");
        assert_eq!(reply, ParsedReply::Json(json!([{"skill": "Rust"}])));
    }

    #[test]
    fn test_parse_structured_invalid_json_falls_back_to_text() {
        let raw = "{ \"path\": [ unterminated";
        assert_eq!(parse_structured(raw), ParsedReply::Text(raw.to_string()));
    }

    #[test]
    fn test_parse_structured_scalar_is_text() {
        assert_eq!(parse_structured("42"), ParsedReply::Text("42".to_string()));
    }

    #[test]
    fn test_api_error_message_extracts_nested_message() {
        let body = r#"{"error": {"message": "quota exceeded", "type": "insufficient_quota"}}"#;
        assert_eq!(api_error_message(body.to_string()), "quota exceeded");
    }

    #[test]
    fn test_api_error_message_passes_plain_body() {
        assert_eq!(api_error_message("bad gateway".to_string()), "bad gateway");
    }
}
