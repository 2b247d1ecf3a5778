//! Configuration module for quizloop.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, ExtractionPrompts, Prompts};
pub use settings::{
    AgentSettings, GeneralSettings, LlmSettings, PlaceholderSettings, PromptSettings,
    QuizSettings, RendererKind, RendererSettings, Settings, ToolSettings, TranscriptionSettings,
};
