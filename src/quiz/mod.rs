//! Quiz data model and the per-step components of the solving loop.
//!
//! - `extractor` - question / submit URL extraction from rendered pages
//! - `resolver` - answer computation through the tool-calling agent
//! - `normalizer` - free text to typed answer coercion
//! - `submission` - answer submission and response parsing

mod extractor;
mod normalizer;
mod resolver;
mod submission;

pub use extractor::{parse_extraction, strip_code_fences, LlmExtractor, QuizExtractor};
pub use normalizer::normalize;
pub use resolver::{AgentResolver, AnswerResolver};
pub use submission::{SubmissionClient, Submitter};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Question data pulled out of one quiz page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractedQuiz {
    pub question: String,
    pub submit_url: String,
    pub required_files: Vec<String>,
}

impl ExtractedQuiz {
    /// Both the question and the submit URL are present.
    pub fn is_complete(&self) -> bool {
        !self.question.trim().is_empty() && !self.submit_url.trim().is_empty()
    }
}

/// Typed answer value sent to the quiz endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Answer::Bool(b) => write!(f, "{}", b),
            Answer::Integer(i) => write!(f, "{}", i),
            Answer::Float(x) => write!(f, "{}", x),
            Answer::Text(s) if s.chars().count() > 120 => {
                let head: String = s.chars().take(117).collect();
                write!(f, "{}... ({} chars)", head, s.chars().count())
            }
            Answer::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Parsed response from a submission endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub correct: bool,
    pub next_url: Option<String>,
    pub reason: Option<String>,
    pub error: Option<String>,
}

impl SubmissionResult {
    /// A failed submission that never produced a usable response.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            correct: false,
            next_url: None,
            reason: None,
            error: Some(error.into()),
        }
    }

    /// Interpret a JSON response body.
    pub fn from_response(body: &serde_json::Value) -> Self {
        let Some(obj) = body.as_object() else {
            return Self::failure(format!("Unexpected response body: {}", body));
        };

        let text = |key: &str| {
            obj.get(key)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        Self {
            correct: obj.get("correct").and_then(|v| v.as_bool()).unwrap_or(false),
            next_url: text("url"),
            reason: text("reason"),
            error: text("error"),
        }
    }
}

/// Terminal state of a quiz chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Last answer was correct and no further link was given.
    Completed,
    /// An answer was marked incorrect after all allowed attempts.
    Rejected,
    /// A URL came up a second time.
    LoopDetected,
    /// The page could not be rendered.
    FetchFailed,
    /// The model output could not be turned into quiz data.
    ExtractionFailed,
    /// Question or submit URL missing from the extracted data.
    IncompleteData,
    /// The chain hit the configured page limit.
    StepLimitReached,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Completed)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Outcome::Completed => "completed",
            Outcome::Rejected => "rejected",
            Outcome::LoopDetected => "loop detected",
            Outcome::FetchFailed => "fetch failed",
            Outcome::ExtractionFailed => "extraction failed",
            Outcome::IncompleteData => "incomplete data",
            Outcome::StepLimitReached => "step limit reached",
        };
        write!(f, "{}", s)
    }
}

/// Mutable state of one quiz chain run.
#[derive(Debug, Clone, Default)]
pub struct QuizState {
    pub current_url: String,
    pub visited: HashSet<String>,
    /// Pages processed so far.
    pub steps: usize,
    pub finished: bool,
}

impl QuizState {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            current_url: start_url.into(),
            ..Default::default()
        }
    }

    /// Seed the visited set, e.g. to resume a chain without revisiting pages.
    pub fn with_visited<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.visited.extend(urls.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_answer_serializes_untagged() {
        assert_eq!(serde_json::to_value(Answer::Integer(4)).unwrap(), json!(4));
        assert_eq!(serde_json::to_value(Answer::Bool(true)).unwrap(), json!(true));
        assert_eq!(serde_json::to_value(Answer::Float(2.5)).unwrap(), json!(2.5));
        assert_eq!(serde_json::to_value(Answer::Text("x".into())).unwrap(), json!("x"));
    }

    #[test]
    fn test_submission_result_from_response() {
        let result = SubmissionResult::from_response(&json!({
            "correct": true,
            "url": "https://q/2",
            "reason": null
        }));
        assert!(result.correct);
        assert_eq!(result.next_url.as_deref(), Some("https://q/2"));
        assert!(result.reason.is_none());
        assert!(result.error.is_none());
    }

    #[test]
    fn test_submission_result_treats_empty_url_as_absent() {
        let result = SubmissionResult::from_response(&json!({"correct": true, "url": ""}));
        assert!(result.correct);
        assert!(result.next_url.is_none());
    }

    #[test]
    fn test_submission_result_non_object() {
        let result = SubmissionResult::from_response(&json!([1, 2]));
        assert!(!result.correct);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_extracted_quiz_completeness() {
        let mut quiz = ExtractedQuiz {
            question: "What is 2+2?".into(),
            submit_url: "https://q/submit".into(),
            required_files: vec![],
        };
        assert!(quiz.is_complete());
        quiz.submit_url = "  ".into();
        assert!(!quiz.is_complete());
    }
}
