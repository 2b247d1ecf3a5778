//! HTTP endpoint that accepts quiz tasks.
//!
//! `POST /` validates the shared secret and starts the quiz loop in the
//! background; the caller never waits for the outcome.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state.
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub secret: String,
}

/// Build the router. Exposed separately so it can be served on any listener.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(status).post(start_quiz))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&e.to_string());
        Output::info("Run 'quizloop doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let state = Arc::new(AppState {
        orchestrator: Arc::new(Orchestrator::new(&settings)?),
        secret: settings.quiz.secret.clone(),
    });

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("quizloop server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Status", "GET  /");
    Output::kv("Start quiz", "POST /  {email, secret, url}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct QuizTask {
    email: String,
    secret: String,
    url: String,
}

async fn status() -> impl IntoResponse {
    Json(json!({"status": "running", "service": "quizloop"}))
}

async fn start_quiz(
    State(state): State<Arc<AppState>>,
    Json(task): Json<QuizTask>,
) -> impl IntoResponse {
    if state.secret.is_empty() || task.secret != state.secret {
        warn!(email = %task.email, "Rejected quiz request with invalid secret");
        return (StatusCode::FORBIDDEN, Json(json!({"detail": "Invalid secret"})));
    }

    info!(email = %task.email, url = %task.url, "Quiz task accepted");

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        let report = orchestrator.run(&task.url).await;
        info!(
            start = %task.url,
            outcome = %report.outcome,
            steps = report.state.steps,
            "Quiz task finished"
        );
    });

    (
        StatusCode::OK,
        Json(json!({"message": "Quiz processing started", "status": "ok"})),
    )
}
