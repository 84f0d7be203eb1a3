//! AI proxy: a typed task selects the system prompt, the provider and whether the
//! reply is expected to be JSON. Structured replies that fail to parse fall back to
//! raw text instead of failing the request.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::system_prompt;
use crate::llm_client::{parse_structured, ChatTurn, CompletionProvider, CompletionRequest, ParsedReply};

pub mod handlers;
pub mod prompts;

/// Prior turns kept when forwarding a conversation.
const MAX_HISTORY_TURNS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiTask {
    CareerPath,
    LearningPath,
    SkillAnalysis,
    MentorChat,
    ResumeFeedback,
}

/// Which of the two integrated providers serves a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Chat-completion API.
    Chat,
    /// Generative-content API.
    Generative,
}

impl AiTask {
    pub fn system_template(self) -> &'static str {
        match self {
            AiTask::CareerPath => prompts::CAREER_PATH_SYSTEM,
            AiTask::LearningPath => prompts::LEARNING_PATH_SYSTEM,
            AiTask::SkillAnalysis => prompts::SKILL_ANALYSIS_SYSTEM,
            AiTask::MentorChat => prompts::MENTOR_CHAT_SYSTEM,
            AiTask::ResumeFeedback => prompts::RESUME_FEEDBACK_SYSTEM,
        }
    }

    /// Whether prior conversation turns are forwarded. Only mentor chat is a conversation.
    pub fn takes_history(self) -> bool {
        matches!(self, AiTask::MentorChat)
    }

    /// Whether the template promises JSON output.
    pub fn structured(self) -> bool {
        !matches!(self, AiTask::MentorChat)
    }

    pub fn provider(self) -> ProviderKind {
        match self {
            AiTask::CareerPath | AiTask::LearningPath => ProviderKind::Generative,
            AiTask::SkillAnalysis | AiTask::MentorChat | AiTask::ResumeFeedback => {
                ProviderKind::Chat
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AiTask::CareerPath => "career_path",
            AiTask::LearningPath => "learning_path",
            AiTask::SkillAnalysis => "skill_analysis",
            AiTask::MentorChat => "mentor_chat",
            AiTask::ResumeFeedback => "resume_feedback",
        }
    }

    /// Default title when a result is kept as a saved insight.
    pub fn insight_title(self) -> &'static str {
        match self {
            AiTask::CareerPath => "Career path recommendations",
            AiTask::LearningPath => "Learning path",
            AiTask::SkillAnalysis => "Skill gap analysis",
            AiTask::MentorChat => "Mentor conversation",
            AiTask::ResumeFeedback => "Resume feedback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyFormat {
    Json,
    Text,
}

#[derive(Debug, Clone, Serialize)]
pub struct AiAnswer {
    #[serde(rename = "type")]
    pub task: AiTask,
    pub format: ReplyFormat,
    pub content: Value,
    pub model: &'static str,
}

/// Runs one task against `provider`. `history` is used by conversational tasks only and
/// is trimmed to the most recent turns.
pub async fn run_task(
    provider: &dyn CompletionProvider,
    task: AiTask,
    prompt: &str,
    history: &[ChatTurn],
) -> Result<AiAnswer, AppError> {
    let system = system_prompt(task.system_template(), task.structured());

    let history: &[ChatTurn] = if task.takes_history() {
        history
    } else {
        if !history.is_empty() {
            debug!("Dropping {} history turn(s) for {}", history.len(), task.as_str());
        }
        &[]
    };
    let skip = history.len().saturating_sub(MAX_HISTORY_TURNS);
    let mut turns: Vec<ChatTurn> = history[skip..].to_vec();
    turns.push(ChatTurn::user(prompt));

    let completion = provider
        .complete(CompletionRequest {
            system: &system,
            turns: &turns,
            json_output: task.structured(),
        })
        .await
        .map_err(|e| AppError::Llm(format!("{} call failed: {e}", task.as_str())))?;

    let reply = if task.structured() {
        parse_structured(&completion.text)
    } else {
        ParsedReply::Text(completion.text.trim().to_string())
    };

    let (format, content) = match reply {
        ParsedReply::Json(value) => (ReplyFormat::Json, value),
        ParsedReply::Text(text) => {
            if task.structured() {
                warn!(
                    "{} reply was not valid JSON; returning raw text",
                    task.as_str()
                );
            }
            (ReplyFormat::Text, Value::String(text))
        }
    };

    Ok(AiAnswer {
        task,
        format,
        content,
        model: completion.model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeLlm;
    use serde_json::json;

    #[test]
    fn test_only_mentor_chat_is_unstructured() {
        assert!(!AiTask::MentorChat.structured());
        for task in [
            AiTask::CareerPath,
            AiTask::LearningPath,
            AiTask::SkillAnalysis,
            AiTask::ResumeFeedback,
        ] {
            assert!(task.structured(), "{task:?}");
        }
    }

    #[test]
    fn test_task_deserializes_from_snake_case() {
        let task: AiTask = serde_json::from_value(json!("skill_analysis")).unwrap();
        assert_eq!(task, AiTask::SkillAnalysis);
        assert_eq!(task.as_str(), "skill_analysis");
    }

    #[test]
    fn test_paths_use_generative_provider() {
        assert_eq!(AiTask::CareerPath.provider(), ProviderKind::Generative);
        assert_eq!(AiTask::LearningPath.provider(), ProviderKind::Generative);
        assert_eq!(AiTask::MentorChat.provider(), ProviderKind::Chat);
    }

    #[tokio::test]
    async fn test_structured_reply_is_parsed() {
        let llm = FakeLlm::replying("```json\n{\"paths\": []}\n```");
        let answer = run_task(&llm, AiTask::CareerPath, "I like data", &[])
            .await
            .unwrap();
        assert_eq!(answer.format, ReplyFormat::Json);
        assert_eq!(answer.content, json!({ "paths": [] }));
    }

    #[tokio::test]
    async fn test_invalid_json_falls_back_to_raw_text() {
        let raw = "Here are some paths: data analyst, then {broken";
        let llm = FakeLlm::replying(raw);
        let answer = run_task(&llm, AiTask::SkillAnalysis, "analyze me", &[])
            .await
            .unwrap();
        assert_eq!(answer.format, ReplyFormat::Text);
        assert_eq!(answer.content, Value::String(raw.to_string()));
    }

    #[tokio::test]
    async fn test_mentor_chat_keeps_json_looking_text_as_text() {
        let llm = FakeLlm::replying("{\"not\": \"parsed\"}");
        let answer = run_task(&llm, AiTask::MentorChat, "hello", &[])
            .await
            .unwrap();
        assert_eq!(answer.format, ReplyFormat::Text);
    }

    #[tokio::test]
    async fn test_history_is_forwarded_for_mentor_chat_only() {
        let history: Vec<ChatTurn> = (0..25)
            .map(|i| ChatTurn::user(format!("turn {i}")))
            .collect();

        let mentor = FakeLlm::replying("keep going");
        run_task(&mentor, AiTask::MentorChat, "next?", &history)
            .await
            .unwrap();
        assert_eq!(mentor.last_turn_count(), Some(MAX_HISTORY_TURNS + 1));

        let analysis = FakeLlm::replying("{}");
        run_task(&analysis, AiTask::SkillAnalysis, "analyze me", &history)
            .await
            .unwrap();
        assert_eq!(analysis.last_turn_count(), Some(1));
    }
}
