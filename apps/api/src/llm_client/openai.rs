//! OpenAI chat-completions backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::{api_error_message, Completion, CompletionProvider, CompletionRequest, LlmError, Role};

/// Hardcoded to keep every call site on the same model.
pub const OPENAI_MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    fn model(&self) -> &'static str {
        OPENAI_MODEL
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion, LlmError> {
        let mut messages = Vec::with_capacity(request.turns.len() + 1);
        messages.push(ChatMessage {
            role: "system",
            content: request.system,
        });
        messages.extend(request.turns.iter().map(|turn| ChatMessage {
            role: match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: &turn.content,
        }));

        let body = ChatRequest {
            model: OPENAI_MODEL,
            messages,
            temperature: TEMPERATURE,
            response_format: request
                .json_output
                .then(|| json!({ "type": "json_object" })),
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("OpenAI returned {status}");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(body),
            });
        }

        let chat: ChatResponse = response.json().await?;
        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;

        let (input_tokens, output_tokens) = chat
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();
        debug!("OpenAI call succeeded: input_tokens={input_tokens}, output_tokens={output_tokens}");

        Ok(Completion {
            text,
            model: OPENAI_MODEL,
            input_tokens,
            output_tokens,
        })
    }
}
