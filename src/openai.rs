//! OpenAI-compatible client configuration.

use crate::config::LlmSettings;
use crate::error::{QuizError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a chat client from the LLM settings.
///
/// The key is read from the configured environment variable, so an
/// OpenAI-compatible endpoint (Gemini, a local proxy) only needs `api_base`
/// and `api_key_env` changed.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_seconds))
        .build()
        .map_err(|e| QuizError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let mut config = OpenAIConfig::new();
    if let Some(key) = settings.api_key() {
        config = config.with_api_key(key);
    }
    if let Some(base) = &settings.api_base {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
