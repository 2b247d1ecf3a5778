//! OpenAI Whisper transcription implementation.

use super::Transcriber;
use crate::error::{QuizError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// Audio formats the transcription endpoint accepts directly.
const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "mp4", "mpeg", "mpga", "m4a", "wav", "webm", "ogg", "flac"];

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: async_openai::Client<OpenAIConfig>,
    model: String,
}

impl WhisperTranscriber {
    pub fn new(client: async_openai::Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        if !audio_path.exists() {
            return Err(QuizError::FileNotFound(audio_path.display().to_string()));
        }

        let extension = audio_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(QuizError::Transcription(format!(
                "Unsupported audio format: .{}",
                extension
            )));
        }

        debug!("Transcribing audio with {}", self.model);
        let file_bytes = tokio::fs::read(audio_path).await?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::Json)
            .build()
            .map_err(|e| QuizError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| QuizError::OpenAI(format!("{} API error: {}", self.model, e)))?;

        Ok(response.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcriber() -> WhisperTranscriber {
        let config = OpenAIConfig::new().with_api_key("test").with_api_base("http://127.0.0.1:9");
        WhisperTranscriber::new(async_openai::Client::with_config(config), "whisper-1")
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = transcriber()
            .transcribe(Path::new("/nonexistent/clip.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not audio").unwrap();

        let err = transcriber().transcribe(&path).await.unwrap_err();
        assert!(matches!(err, QuizError::Transcription(_)));
    }
}
