//! quizloop - autonomous solver for chained web quizzes
//!
//! Given the URL of a quiz page, quizloop renders it in a headless browser,
//! has a model pull out the question and submission endpoint, works out the
//! answer with a tool-calling agent (downloads, document reading, Python,
//! OCR, transcription), submits it and follows the next URL until the chain
//! ends.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `renderer` - Page rendering (headless Chromium or plain HTTP)
//! - `quiz` - Extraction, answer resolution, normalization and submission
//! - `agent` - Tool-calling agent loop
//! - `toolbox` - File, code, OCR and encoding helpers behind the agent's tools
//! - `transcription` - Speech-to-text for audio files
//! - `placeholder` - Shared store that keeps base64 payloads out of the model context
//! - `orchestrator` - The quiz loop controller
//! - `cli` - Command line and HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use quizloop::config::Settings;
//! use quizloop::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(&settings)?;
//!
//!     let report = orchestrator.run("https://quiz.example/start").await;
//!     println!("{} after {} pages", report.outcome, report.state.steps);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod placeholder;
pub mod quiz;
pub mod renderer;
pub mod toolbox;
pub mod transcription;

pub use error::{QuizError, Result};
