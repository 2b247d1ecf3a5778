//! Quiz loop controller.
//!
//! Drives one chain of quiz pages: render, extract, resolve, normalize,
//! submit, then follow the next URL until the chain ends.

use crate::config::{Prompts, QuizSettings, Settings};
use crate::error::Result;
use crate::openai::create_client;
use crate::placeholder::PlaceholderStore;
use crate::quiz::{
    normalize, AgentResolver, Answer, AnswerResolver, LlmExtractor, Outcome, QuizExtractor,
    QuizState, SubmissionClient, SubmissionResult, Submitter,
};
use crate::renderer::{create_renderer, PageRenderer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Bounds applied to every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopPolicy {
    /// Maximum number of pages processed in one chain.
    pub max_steps: usize,
    /// Extra attempts after an answer is marked incorrect.
    pub max_retries: usize,
    /// Characters of page content handed to the resolver.
    pub context_char_budget: usize,
}

impl Default for LoopPolicy {
    fn default() -> Self {
        Self {
            max_steps: 50,
            max_retries: 0,
            context_char_budget: 5_000,
        }
    }
}

impl From<&QuizSettings> for LoopPolicy {
    fn from(settings: &QuizSettings) -> Self {
        Self {
            max_steps: settings.max_steps,
            max_retries: settings.max_retries,
            context_char_budget: settings.context_char_budget,
        }
    }
}

/// How a run ended and the state it ended in.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: Outcome,
    pub state: QuizState,
    /// Response to the last submission, if any was made.
    pub last_submission: Option<SubmissionResult>,
}

/// The quiz loop and its components.
pub struct Orchestrator {
    renderer: Arc<dyn PageRenderer>,
    extractor: Arc<dyn QuizExtractor>,
    resolver: Arc<dyn AnswerResolver>,
    submitter: Arc<dyn Submitter>,
    placeholders: Arc<PlaceholderStore>,
    policy: LoopPolicy,
}

impl Orchestrator {
    /// Build every component from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

        let placeholders = Arc::new(match settings.placeholders.ttl_seconds {
            Some(ttl) => PlaceholderStore::with_ttl_seconds(ttl),
            None => PlaceholderStore::new(),
        });

        std::fs::create_dir_all(settings.download_dir())?;
        std::fs::create_dir_all(settings.temp_dir())?;

        let renderer = create_renderer(&settings.renderer)?;
        let extractor = Arc::new(LlmExtractor::new(
            create_client(&settings.llm)?,
            &settings.llm.model,
            prompts.extraction.clone(),
            settings.quiz.page_char_budget,
        ));
        let resolver = Arc::new(AgentResolver::from_settings(
            settings,
            &prompts.agent,
            placeholders.clone(),
        )?);
        let submitter = Arc::new(SubmissionClient::new(
            &settings.quiz.email,
            &settings.quiz.secret,
            Duration::from_secs(settings.quiz.submit_timeout_seconds),
        )?);

        info!(
            model = %settings.llm.model,
            renderer = %settings.renderer.kind,
            "Quiz loop ready"
        );

        Ok(Self::with_components(
            renderer,
            extractor,
            resolver,
            submitter,
            placeholders,
            LoopPolicy::from(&settings.quiz),
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        renderer: Arc<dyn PageRenderer>,
        extractor: Arc<dyn QuizExtractor>,
        resolver: Arc<dyn AnswerResolver>,
        submitter: Arc<dyn Submitter>,
        placeholders: Arc<PlaceholderStore>,
        policy: LoopPolicy,
    ) -> Self {
        Self {
            renderer,
            extractor,
            resolver,
            submitter,
            placeholders,
            policy,
        }
    }

    /// Solve a chain starting at `start_url`.
    pub async fn run(&self, start_url: &str) -> RunReport {
        self.run_from(QuizState::new(start_url)).await
    }

    /// Solve a chain from an existing state, e.g. with a pre-seeded visited set.
    #[instrument(skip(self, state), fields(start = %state.current_url))]
    pub async fn run_from(&self, mut state: QuizState) -> RunReport {
        let mut last_submission = None;

        let evicted = self.placeholders.evict_expired();
        if evicted > 0 {
            debug!(evicted, "Dropped expired placeholders");
        }

        let outcome = loop {
            if state.visited.contains(&state.current_url) {
                break Outcome::LoopDetected;
            }
            if state.steps >= self.policy.max_steps {
                break Outcome::StepLimitReached;
            }
            state.visited.insert(state.current_url.clone());
            state.steps += 1;

            let url = state.current_url.clone();
            info!(step = state.steps, "Processing {}", url);

            let html = match self.renderer.render(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Failed to render {}: {}", url, e);
                    break Outcome::FetchFailed;
                }
            };

            let Some(quiz) = self.extractor.extract(&html).await else {
                break Outcome::ExtractionFailed;
            };
            if !quiz.is_complete() {
                warn!(
                    question = %quiz.question,
                    submit_url = %quiz.submit_url,
                    "Extracted quiz is missing fields"
                );
                break Outcome::IncompleteData;
            }
            info!("Question: {}", quiz.question);

            let submit_url = resolve_url(&url, &quiz.submit_url);
            let files: Vec<String> = quiz
                .required_files
                .iter()
                .map(|f| resolve_url(&url, f))
                .collect();
            let context = build_context(&html, &files, self.policy.context_char_budget);

            let result = self
                .answer_and_submit(&quiz.question, &context, &submit_url, &url)
                .await;
            let correct = result.correct;
            let next = result.next_url.as_deref().map(|n| resolve_url(&url, n));
            last_submission = Some(result);

            match (correct, next) {
                (true, Some(next)) => {
                    info!("Correct, moving on to {}", next);
                    state.current_url = next;
                }
                (true, None) => break Outcome::Completed,
                (false, _) => break Outcome::Rejected,
            }
        };

        state.finished = true;
        if outcome.is_success() {
            info!(steps = state.steps, "Quiz chain {}", outcome);
        } else {
            warn!(steps = state.steps, url = %state.current_url, "Quiz chain ended: {}", outcome);
        }

        RunReport {
            outcome,
            state,
            last_submission,
        }
    }

    /// Resolve, normalize and submit, retrying incorrect answers per policy.
    async fn answer_and_submit(
        &self,
        question: &str,
        context: &str,
        submit_url: &str,
        page_url: &str,
    ) -> SubmissionResult {
        let mut prompt = question.to_string();
        let mut attempt = 0;

        loop {
            let raw = self.resolver.resolve(&prompt, context).await;
            let answer = normalize(&raw, &self.placeholders);
            debug!(attempt, "Answer: {}", answer);

            let result = self.submitter.submit(submit_url, &answer, page_url).await;
            if result.correct || attempt >= self.policy.max_retries {
                if !result.correct {
                    warn!(
                        reason = result.reason.as_deref().unwrap_or("-"),
                        error = result.error.as_deref().unwrap_or("-"),
                        "Answer rejected"
                    );
                }
                return result;
            }

            attempt += 1;
            info!(attempt, "Answer marked incorrect, retrying");
            prompt = retry_prompt(question, &answer, &result);
        }
    }
}

fn retry_prompt(question: &str, answer: &Answer, result: &SubmissionResult) -> String {
    let why = result
        .reason
        .as_deref()
        .or(result.error.as_deref())
        .map(|r| format!(" ({})", r))
        .unwrap_or_default();
    format!(
        "{}\n\nA previous answer `{}` was marked incorrect{}. Work it out again.",
        question, answer, why
    )
}

/// Resolver context: referenced files first, then the page, cut to `budget` chars.
fn build_context(html: &str, files: &[String], budget: usize) -> String {
    let mut context = String::new();
    if !files.is_empty() {
        context.push_str("Required files:\n");
        for file in files {
            context.push_str("- ");
            context.push_str(file);
            context.push('\n');
        }
        context.push('\n');
    }
    context.push_str(html);
    context.chars().take(budget).collect()
}

/// Resolve a possibly relative URL against the page it came from.
pub fn resolve_url(base: &str, candidate: &str) -> String {
    if url::Url::parse(candidate).is_ok() {
        return candidate.to_string();
    }
    url::Url::parse(base)
        .and_then(|b| b.join(candidate))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| candidate.to_string())
}
