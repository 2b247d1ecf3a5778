//! Error types for quizloop.

use thiserror::Error;

/// Library-level error type for quizloop operations.
#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Page render failed: {0}")]
    Render(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

/// Result type alias for quizloop operations.
pub type Result<T> = std::result::Result<T, QuizError>;
