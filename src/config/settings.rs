//! Configuration settings for quizloop.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub quiz: QuizSettings,
    pub agent: AgentSettings,
    pub renderer: RendererSettings,
    pub tools: ToolSettings,
    pub placeholders: PlaceholderSettings,
    pub transcription: TranscriptionSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory where downloaded quiz files are written.
    pub download_dir: String,
    /// Directory for temporary files (generated scripts, converted audio).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            download_dir: ".".to_string(),
            temp_dir: "/tmp/quizloop".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Chat model settings. Any OpenAI-compatible endpoint works.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model used for extraction and answering.
    pub model: String,
    /// Base URL override, e.g. `https://generativelanguage.googleapis.com/v1beta/openai`.
    pub api_base: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_seconds: 300,
        }
    }
}

impl LlmSettings {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

/// Quiz chain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
    /// Identity sent with every submission.
    pub email: String,
    /// Shared secret checked on inbound requests and sent with submissions.
    pub secret: String,
    /// Maximum number of pages visited in one chain.
    pub max_steps: usize,
    /// Extra resolve/submit attempts after an incorrect answer.
    pub max_retries: usize,
    /// Characters of page content sent to the extractor.
    pub page_char_budget: usize,
    /// Characters of page content sent to the resolver as context.
    pub context_char_budget: usize,
    /// Timeout for answer submission in seconds.
    pub submit_timeout_seconds: u64,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            email: String::new(),
            secret: String::new(),
            max_steps: 50,
            max_retries: 0,
            page_char_budget: 15_000,
            context_char_budget: 5_000,
            submit_timeout_seconds: 10,
        }
    }
}

/// Reasoning agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum number of model round trips before the agent gives up.
    pub max_tool_rounds: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self { max_tool_rounds: 15 }
    }
}

/// Page renderer backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Headless Chromium, runs client-side scripts (default).
    #[default]
    Chromium,
    /// Plain HTTP GET, no script execution.
    Http,
}

impl std::str::FromStr for RendererKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chromium" | "chrome" | "browser" => Ok(RendererKind::Chromium),
            "http" | "plain" => Ok(RendererKind::Http),
            _ => Err(format!("Unknown renderer: {}", s)),
        }
    }
}

impl std::fmt::Display for RendererKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RendererKind::Chromium => write!(f, "chromium"),
            RendererKind::Http => write!(f, "http"),
        }
    }
}

/// Page renderer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub kind: RendererKind,
    /// Navigation timeout in seconds.
    pub navigation_timeout_seconds: u64,
    /// Extra wait after navigation so late scripts can finish, in milliseconds.
    pub settle_millis: u64,
    /// Explicit Chrome/Chromium binary. Auto-detected when unset.
    pub chrome_executable: Option<String>,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            kind: RendererKind::Chromium,
            navigation_timeout_seconds: 60,
            settle_millis: 1_000,
            chrome_executable: None,
        }
    }
}

/// External binaries used by the agent tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub python: String,
    pub tesseract: String,
    pub pdftotext: String,
    /// Wall-clock limit for generated code, in seconds.
    pub code_timeout_seconds: u64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            tesseract: "tesseract".to_string(),
            pdftotext: "pdftotext".to_string(),
            code_timeout_seconds: 30,
        }
    }
}

/// Placeholder store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderSettings {
    /// Evict payloads older than this many seconds. None keeps them forever.
    pub ttl_seconds: Option<u64>,
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    pub model: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory with `extraction.toml` / `agent.toml` overriding the built-in prompts.
    pub custom_dir: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// `QUIZ_EMAIL` and `QUIZ_SECRET` override the file values.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env();
        Ok(settings)
    }

    fn apply_env(&mut self) {
        if let Ok(email) = std::env::var("QUIZ_EMAIL") {
            self.quiz.email = email;
        }
        if let Ok(secret) = std::env::var("QUIZ_SECRET") {
            self.quiz.secret = secret;
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quizloop")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded download directory path.
    pub fn download_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.download_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}
