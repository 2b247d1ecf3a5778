//! Pre-flight checks before starting a quiz chain.
//!
//! Catches missing credentials or a missing Python interpreter up front
//! instead of on the first model call, tool call or submission.

use crate::config::Settings;
use crate::error::{QuizError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Serving needs everything solving needs, plus the shared secret.
    Serve,
    /// Solving needs the model key, the submission credentials and Python.
    Solve,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_api_key(settings)?;
    check_set("QUIZ_EMAIL", &settings.quiz.email)?;
    if let Operation::Serve = operation {
        check_set("QUIZ_SECRET", &settings.quiz.secret)?;
    }
    check_tool(&settings.tools.python)?;
    Ok(())
}

/// Check that the model API key is configured.
pub fn check_api_key(settings: &Settings) -> Result<()> {
    let env = &settings.llm.api_key_env;
    match settings.llm.api_key() {
        Some(_) => Ok(()),
        None => Err(QuizError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            env, env
        ))),
    }
}

fn check_set(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(QuizError::Config(format!(
            "{} not set. Export it or set it in the [quiz] config section",
            name
        )))
    } else {
        Ok(())
    }
}

/// Check that an external tool can be started.
fn check_tool(binary: &str) -> Result<()> {
    match Command::new(binary).arg("--version").output() {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(QuizError::ToolNotFound(binary.to_string()))
        }
        Err(e) => Err(QuizError::ToolNotFound(format!("{}: {}", binary, e))),
    }
}
