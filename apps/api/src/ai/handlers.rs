//! Axum route handlers for the AI proxy.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::ai::{run_task, AiAnswer, AiTask, ProviderKind};
use crate::auth::ActiveSubscriber;
use crate::errors::AppError;
use crate::insights::store::insert_insight;
use crate::llm_client::{ChatTurn, CompletionProvider};
use crate::models::insight::NewInsight;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AiRequest {
    #[serde(rename = "type")]
    pub task: AiTask,
    pub prompt: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    /// Keep the result as a saved insight.
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
pub struct AiResponse {
    #[serde(flatten)]
    pub answer: AiAnswer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_insight_id: Option<Uuid>,
}

pub fn provider_for(state: &AppState, kind: ProviderKind) -> &dyn CompletionProvider {
    match kind {
        ProviderKind::Chat => state.chat_llm.as_ref(),
        ProviderKind::Generative => state.generative_llm.as_ref(),
    }
}

/// POST /api/v1/ai/complete
///
/// Forwards the prompt to the provider the task is bound to. Premium only.
pub async fn handle_complete(
    State(state): State<AppState>,
    ActiveSubscriber(user): ActiveSubscriber,
    Json(request): Json<AiRequest>,
) -> Result<Json<AiResponse>, AppError> {
    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }

    let provider = provider_for(&state, request.task.provider());
    let answer = run_task(provider, request.task, &request.prompt, &request.history).await?;
    info!(
        "AI task {} for user {} answered by {} ({:?})",
        request.task.as_str(),
        user.user_id,
        answer.model,
        answer.format
    );

    let saved_insight_id = if request.save {
        let row = insert_insight(
            &state.db,
            user.user_id,
            &NewInsight {
                insight_type: request.task.as_str().to_string(),
                title: request.task.insight_title().to_string(),
                content: answer.content.clone(),
            },
        )
        .await?;
        Some(row.id)
    } else {
        None
    };

    Ok(Json(AiResponse {
        answer,
        saved_insight_id,
    }))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{
        body_json, issue_token, post_json, test_state_with_llm, FakeBilling, FakeLlm,
        MemoryBillingStore,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_complete_returns_raw_text_when_json_is_invalid() {
        let user_id = Uuid::new_v4();
        let chat = Arc::new(FakeLlm::replying("I think you should {not json"));
        let state = test_state_with_llm(
            Arc::new(MemoryBillingStore::with_active(user_id)),
            Arc::new(FakeBilling::default()),
            chat.clone(),
            Arc::new(FakeLlm::replying("{}")),
        );

        let response = post_json(
            state,
            "/api/v1/ai/complete",
            Some(&issue_token(user_id)),
            json!({ "type": "skill_analysis", "prompt": "I know SQL; target: data engineer" }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["format"], json!("text"));
        assert_eq!(body["content"], json!("I think you should {not json"));
        assert_eq!(body["type"], json!("skill_analysis"));
        assert_eq!(chat.call_count(), 1);
    }

    #[tokio::test]
    async fn test_career_path_routes_to_generative_provider() {
        let user_id = Uuid::new_v4();
        let chat = Arc::new(FakeLlm::replying("{}"));
        let generative = Arc::new(FakeLlm::replying("{\"paths\": [{\"title\": \"ML Engineer\"}]}"));
        let state = test_state_with_llm(
            Arc::new(MemoryBillingStore::with_active(user_id)),
            Arc::new(FakeBilling::default()),
            chat.clone(),
            generative.clone(),
        );

        let response = post_json(
            state,
            "/api/v1/ai/complete",
            Some(&issue_token(user_id)),
            json!({ "type": "career_path", "prompt": "Physics grad who codes" }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["format"], json!("json"));
        assert_eq!(body["content"]["paths"][0]["title"], json!("ML Engineer"));
        assert_eq!(generative.call_count(), 1);
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn test_complete_requires_active_subscription() {
        let state = test_state_with_llm(
            Arc::new(MemoryBillingStore::default()),
            Arc::new(FakeBilling::default()),
            Arc::new(FakeLlm::replying("hi")),
            Arc::new(FakeLlm::replying("hi")),
        );
        let response = post_json(
            state,
            "/api/v1/ai/complete",
            Some(&issue_token(Uuid::new_v4())),
            json!({ "type": "mentor_chat", "prompt": "hello" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn test_complete_rejects_empty_prompt() {
        let user_id = Uuid::new_v4();
        let state = test_state_with_llm(
            Arc::new(MemoryBillingStore::with_active(user_id)),
            Arc::new(FakeBilling::default()),
            Arc::new(FakeLlm::replying("hi")),
            Arc::new(FakeLlm::replying("hi")),
        );
        let response = post_json(
            state,
            "/api/v1/ai/complete",
            Some(&issue_token(user_id)),
            json!({ "type": "mentor_chat", "prompt": "   " }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_mentor_chat_forwards_history() {
        let user_id = Uuid::new_v4();
        let state = test_state_with_llm(
            Arc::new(MemoryBillingStore::with_active(user_id)),
            Arc::new(FakeBilling::default()),
            Arc::new(FakeLlm::replying("Start with a portfolio.")),
            Arc::new(FakeLlm::replying("{}")),
        );
        let response = post_json(
            state,
            "/api/v1/ai/complete",
            Some(&issue_token(user_id)),
            json!({
                "type": "mentor_chat",
                "prompt": "What next?",
                "history": [
                    { "role": "user", "content": "I want to switch to UX." },
                    { "role": "assistant", "content": "Great, what is your background?" }
                ]
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["content"], json!("Start with a portfolio."));
        assert!(body.get("saved_insight_id").is_none());
    }
}
