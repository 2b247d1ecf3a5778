//! Answer computation through the tool-calling agent.

use crate::agent::{Agent, ToolContext};
use crate::config::{AgentPrompts, Prompts, Settings};
use crate::error::Result;
use crate::openai::create_client;
use crate::placeholder::PlaceholderStore;
use crate::transcription::WhisperTranscriber;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Produces the final answer text for a question.
///
/// Never fails: problems are returned as readable error text, which then
/// gets submitted like any other answer.
#[async_trait]
pub trait AnswerResolver: Send + Sync {
    async fn resolve(&self, question: &str, context: &str) -> String;
}

/// Resolver backed by the tool-calling [`Agent`].
pub struct AgentResolver {
    agent: Option<Agent>,
    user_template: String,
    api_key_env: String,
}

impl AgentResolver {
    /// Wrap a configured agent, rendering the system prompt for `email`.
    pub fn new(agent: Agent, prompts: &AgentPrompts, email: &str) -> Self {
        let mut vars = HashMap::new();
        vars.insert("email".to_string(), email.to_string());
        let system = Prompts::render(&prompts.system, &vars);

        Self {
            agent: Some(agent.with_system_prompt(&system)),
            user_template: prompts.user.clone(),
            api_key_env: String::new(),
        }
    }

    /// A resolver that only reports the missing credential.
    pub fn unavailable(api_key_env: &str) -> Self {
        Self {
            agent: None,
            user_template: String::new(),
            api_key_env: api_key_env.to_string(),
        }
    }

    /// Build the agent, its tools and the transcriber from settings.
    pub fn from_settings(
        settings: &Settings,
        prompts: &AgentPrompts,
        placeholders: Arc<PlaceholderStore>,
    ) -> Result<Self> {
        if settings.llm.api_key().is_none() {
            warn!("{} not set, answers will be error text", settings.llm.api_key_env);
            return Ok(Self::unavailable(&settings.llm.api_key_env));
        }

        let client = create_client(&settings.llm)?;
        let transcriber = Arc::new(WhisperTranscriber::new(
            client.clone(),
            &settings.transcription.model,
        ));
        let tools = ToolContext::new(
            settings.download_dir(),
            settings.temp_dir(),
            placeholders,
            transcriber,
            settings.tools.clone(),
        );
        let agent = Agent::new(client, &settings.llm.model, tools)
            .with_max_iterations(settings.agent.max_tool_rounds);

        Ok(Self::new(agent, prompts, &settings.quiz.email))
    }
}

#[async_trait]
impl AnswerResolver for AgentResolver {
    #[instrument(skip(self, context), fields(context_len = context.len()))]
    async fn resolve(&self, question: &str, context: &str) -> String {
        let Some(agent) = &self.agent else {
            return format!("Error: {} not set.", self.api_key_env);
        };

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        vars.insert("question".to_string(), question.to_string());
        let prompt = Prompts::render(&self.user_template, &vars);

        match agent.run(&prompt).await {
            Ok(response) => {
                info!(
                    tool_calls = response.tool_calls.len(),
                    iterations = response.iterations,
                    "Agent finished"
                );
                response.content.trim().to_string()
            }
            Err(e) => {
                warn!("Agent failed: {}", e);
                format!("Error processing request: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LlmSettings, ToolSettings};
    use crate::error::QuizError;
    use crate::transcription::Transcriber;
    use serde_json::json;
    use std::path::Path;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct NoTranscriber;

    #[async_trait]
    impl Transcriber for NoTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
            Err(QuizError::Transcription("unavailable".into()))
        }
    }

    fn resolver(server: &MockServer, dir: &Path) -> AgentResolver {
        let llm = LlmSettings {
            api_base: Some(server.uri()),
            ..Default::default()
        };
        let tools = ToolContext::new(
            dir.to_path_buf(),
            dir.to_path_buf(),
            Arc::new(PlaceholderStore::new()),
            Arc::new(NoTranscriber),
            ToolSettings::default(),
        );
        let agent = Agent::new(create_client(&llm).unwrap(), "gpt-4o-mini", tools);
        AgentResolver::new(agent, &AgentPrompts::default(), "me@example.com")
    }

    #[tokio::test]
    async fn test_missing_key_message() {
        let resolver = AgentResolver::unavailable("OPENAI_API_KEY");
        assert_eq!(
            resolver.resolve("What is 2+2?", "").await,
            "Error: OPENAI_API_KEY not set."
        );
    }

    #[tokio::test]
    async fn test_prompt_carries_email_question_and_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("me@example.com"))
            .and(body_string_contains("What is 2+2?"))
            .and(body_string_contains("<p>arith</p>"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "created": 1700000000,
                "model": "gpt-4o-mini",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "  4\n"},
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let answer = resolver(&server, dir.path())
            .resolve("What is 2+2?", "<p>arith</p>")
            .await;
        assert_eq!(answer, "4");
    }

    #[tokio::test]
    async fn test_model_error_becomes_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "message": "model not found",
                    "type": "invalid_request_error",
                    "param": null,
                    "code": null
                }
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let answer = resolver(&server, dir.path()).resolve("Q", "").await;
        assert!(answer.starts_with("Error processing request:"));
        assert!(answer.contains("model not found"));
    }
}
