//! Solve command - run one quiz chain in the foreground.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the solve command.
pub async fn run_solve(
    url: &str,
    max_steps: Option<usize>,
    max_retries: Option<usize>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Solve, &settings) {
        Output::error(&e.to_string());
        Output::info("Run 'quizloop doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(steps) = max_steps {
        settings.quiz.max_steps = steps;
    }
    if let Some(retries) = max_retries {
        settings.quiz.max_retries = retries;
    }

    let orchestrator = Orchestrator::new(&settings)?;

    let spinner = Output::spinner(&format!("Solving {}", url));
    let report = orchestrator.run(url).await;
    spinner.finish_and_clear();

    Output::outcome(report.outcome, report.state.steps);
    Output::kv("Last page", &report.state.current_url);
    if let Some(last) = &report.last_submission {
        Output::kv("Correct", &last.correct.to_string());
        if let Some(reason) = &last.reason {
            Output::kv("Reason", reason);
        }
        if let Some(error) = &last.error {
            Output::kv("Error", error);
        }
    }

    if !report.outcome.is_success() {
        anyhow::bail!("quiz chain ended: {}", report.outcome);
    }
    Ok(())
}
