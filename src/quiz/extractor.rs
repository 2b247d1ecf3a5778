//! Quiz extraction from rendered page content.

use super::ExtractedQuiz;
use crate::config::{ExtractionPrompts, Prompts};
use crate::error::{QuizError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Turns page content into structured quiz data.
///
/// Implementations never fail loudly: any problem yields `None` and the
/// caller decides what to do with it.
#[async_trait]
pub trait QuizExtractor: Send + Sync {
    async fn extract(&self, page_content: &str) -> Option<ExtractedQuiz>;
}

/// Extractor backed by a chat model with a strict-JSON prompt.
pub struct LlmExtractor {
    client: async_openai::Client<OpenAIConfig>,
    model: String,
    prompts: ExtractionPrompts,
    char_budget: usize,
}

impl LlmExtractor {
    pub fn new(
        client: async_openai::Client<OpenAIConfig>,
        model: &str,
        prompts: ExtractionPrompts,
        char_budget: usize,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            prompts,
            char_budget,
        }
    }

    async fn complete(&self, page_content: &str) -> Result<String> {
        let truncated: String = page_content.chars().take(self.char_budget).collect();

        let mut vars = HashMap::new();
        vars.insert("html".to_string(), truncated);
        let prompt = Prompts::render(&self.prompts.user, &vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| QuizError::Extraction(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.0)
            .build()
            .map_err(|e| QuizError::Extraction(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| QuizError::OpenAI(format!("Extraction API error: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| QuizError::Extraction("Empty response from model".to_string()))
    }
}

#[async_trait]
impl QuizExtractor for LlmExtractor {
    #[instrument(skip(self, page_content), fields(len = page_content.len()))]
    async fn extract(&self, page_content: &str) -> Option<ExtractedQuiz> {
        let text = match self.complete(page_content).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Quiz extraction failed: {}", e);
                return None;
            }
        };

        let quiz = parse_extraction(&text);
        if quiz.is_none() {
            warn!("Could not parse quiz data from model output");
            debug!("Model output: {}", text);
        }
        quiz
    }
}

/// Intermediate shape so that `null` and absent fields both read as empty.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawQuiz {
    question: Option<String>,
    submit_url: Option<String>,
    required_files: serde_json::Value,
}

/// Parse model output into quiz data.
///
/// Returns `None` for anything that is not a non-empty JSON object with
/// string `question` and `submit_url` fields. Missing keys come back as empty strings so the caller can
/// tell "garbage" apart from "incomplete".
pub fn parse_extraction(text: &str) -> Option<ExtractedQuiz> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fences(text)).ok()?;
    let is_empty_object = value.as_object().is_some_and(|o| o.is_empty());
    if !value.is_object() || is_empty_object {
        return None;
    }

    let raw: RawQuiz = serde_json::from_value(value).ok()?;
    Some(ExtractedQuiz {
        question: raw.question.unwrap_or_default().trim().to_string(),
        submit_url: raw.submit_url.unwrap_or_default().trim().to_string(),
        required_files: file_list(&raw.required_files),
    })
}

/// String entries of `required_files`; any other shape reads as no files.
fn file_list(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Remove a surrounding Markdown code fence, preferring a ```json block.
pub fn strip_code_fences(text: &str) -> &str {
    let inner = if let Some((_, rest)) = text.split_once("```json") {
        rest.split("```").next().unwrap_or(rest)
    } else if text.contains("```") {
        text.split("```").nth(1).unwrap_or(text)
    } else {
        text
    };
    inner.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmSettings;
    use crate::openai::create_client;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn extractor(server: &MockServer, budget: usize) -> LlmExtractor {
        let llm = LlmSettings {
            api_base: Some(server.uri()),
            ..Default::default()
        };
        LlmExtractor::new(
            create_client(&llm).unwrap(),
            "gpt-4o-mini",
            ExtractionPrompts::default(),
            budget,
        )
    }

    fn reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        }))
    }

    #[tokio::test]
    async fn test_extract_from_model_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("<h1>Q1</h1>"))
            .respond_with(reply(
                "```json\n{\"question\": \"What is 2+2?\", \"submit_url\": \"https://q/submit\"}\n```",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let quiz = extractor(&server, 15_000).extract("<h1>Q1</h1>").await.unwrap();
        assert_eq!(quiz.question, "What is 2+2?");
        assert_eq!(quiz.submit_url, "https://q/submit");
    }

    #[tokio::test]
    async fn test_extract_truncates_page() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("TAIL"))
            .respond_with(reply(r#"{"question": "too long", "submit_url": "/s"}"#))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(reply(r#"{"question": "truncated", "submit_url": "/s"}"#))
            .mount(&server)
            .await;

        let page = format!("{}TAIL", "x".repeat(50));
        let quiz = extractor(&server, 50).extract(&page).await.unwrap();
        assert_eq!(quiz.question, "truncated");
    }

    #[tokio::test]
    async fn test_model_error_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "bad key", "type": "auth", "param": null, "code": null}
            })))
            .mount(&server)
            .await;

        assert!(extractor(&server, 100).extract("<p>hi</p>").await.is_none());
    }

    #[test]
    fn test_parse_plain_json() {
        let quiz = parse_extraction(
            r#"{"question": "What is 2+2?", "submit_url": "https://q/submit", "required_files": ["https://q/data.csv"]}"#,
        )
        .unwrap();
        assert_eq!(quiz.question, "What is 2+2?");
        assert_eq!(quiz.submit_url, "https://q/submit");
        assert_eq!(quiz.required_files, vec!["https://q/data.csv"]);
    }

    #[test]
    fn test_parse_fenced_json() {
        let text = "Here you go:\n```json\n{\"question\": \"Q\", \"submit_url\": \"/s\"}\n```\nDone.";
        let quiz = parse_extraction(text).unwrap();
        assert_eq!(quiz.question, "Q");
        assert_eq!(quiz.submit_url, "/s");
        assert!(quiz.required_files.is_empty());
    }

    #[test]
    fn test_parse_bare_fence() {
        let text = "```\n{\"question\": \"Q\", \"submit_url\": \"/s\"}\n```";
        assert_eq!(parse_extraction(text).unwrap().question, "Q");
    }

    #[test]
    fn test_missing_fields_read_as_empty() {
        let quiz = parse_extraction(r#"{"question": "Q", "submit_url": null}"#).unwrap();
        assert_eq!(quiz.submit_url, "");
        assert!(!quiz.is_complete());
    }

    #[test]
    fn test_malformed_output_is_none() {
        assert!(parse_extraction("I could not find a question on this page.").is_none());
        assert!(parse_extraction("{\"question\": ").is_none());
        assert!(parse_extraction("[\"question\"]").is_none());
        assert!(parse_extraction("null").is_none());
        assert!(parse_extraction("{}").is_none());
        assert!(parse_extraction(r#"{"question": 5, "submit_url": "/s"}"#).is_none());
    }

    #[test]
    fn test_odd_required_files_shapes_are_tolerated() {
        let base = r#""question": "What is 2+2?", "submit_url": "https://q/submit""#;

        for files in [r#""none""#, r#"[{"url": "https://q/a.csv"}]"#, "[null]", "{}", "3"] {
            let text = format!("{{{}, \"required_files\": {}}}", base, files);
            let quiz = parse_extraction(&text).unwrap();
            assert_eq!(quiz.question, "What is 2+2?");
            assert!(quiz.required_files.is_empty(), "{}", files);
            assert!(quiz.is_complete());
        }

        let mixed = format!(
            "{{{}, \"required_files\": [\"https://q/a.csv\", null, 7, \" \"]}}",
            base
        );
        assert_eq!(
            parse_extraction(&mixed).unwrap().required_files,
            vec!["https://q/a.csv"]
        );
    }

    #[test]
    fn test_strip_code_fences_passthrough() {
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }
}
