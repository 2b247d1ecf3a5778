//! Answer submission to the quiz endpoint.

use super::{Answer, SubmissionResult};
use crate::error::{QuizError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Posts answers to a quiz endpoint.
///
/// Every failure is folded into the returned `SubmissionResult`; the loop
/// never sees a transport error.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, submit_url: &str, answer: &Answer, original_url: &str)
        -> SubmissionResult;
}

#[derive(Serialize)]
struct SubmissionPayload<'a> {
    email: &'a str,
    secret: &'a str,
    url: &'a str,
    answer: &'a Answer,
}

/// HTTP submission client carrying the solver's credentials.
pub struct SubmissionClient {
    http: reqwest::Client,
    email: String,
    secret: String,
}

impl SubmissionClient {
    /// Create a client with a fixed request timeout.
    pub fn new(email: &str, secret: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuizError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            email: email.to_string(),
            secret: secret.to_string(),
        })
    }

    async fn post(&self, submit_url: &str, answer: &Answer, original_url: &str) -> Result<serde_json::Value> {
        let payload = SubmissionPayload {
            email: &self.email,
            secret: &self.secret,
            url: original_url,
            answer,
        };

        let response = self.http.post(submit_url).json(&payload).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("Submission response ({}): {}", status, body);

        serde_json::from_str(&body).map_err(|e| {
            QuizError::Submission(format!("Non-JSON response (HTTP {}): {}", status, e))
        })
    }
}

#[async_trait]
impl Submitter for SubmissionClient {
    #[instrument(skip(self, answer), fields(answer = %answer))]
    async fn submit(
        &self,
        submit_url: &str,
        answer: &Answer,
        original_url: &str,
    ) -> SubmissionResult {
        info!("Submitting answer to {}", submit_url);

        match self.post(submit_url, answer, original_url).await {
            Ok(body) => {
                let result = SubmissionResult::from_response(&body);
                info!(
                    correct = result.correct,
                    next = result.next_url.as_deref().unwrap_or("-"),
                    "Submission result"
                );
                result
            }
            Err(e) => {
                warn!("Submission failed: {}", e);
                SubmissionResult::failure(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(timeout_ms: u64) -> SubmissionClient {
        SubmissionClient::new("me@example.com", "s3cret", Duration::from_millis(timeout_ms)).unwrap()
    }

    #[tokio::test]
    async fn test_submit_sends_credentials_and_parses_next_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(body_json(json!({
                "email": "me@example.com",
                "secret": "s3cret",
                "url": "https://q/1",
                "answer": 4
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"correct": true, "url": "https://q/2"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = client(2_000)
            .submit(&format!("{}/submit", server.uri()), &Answer::Integer(4), "https://q/1")
            .await;

        assert!(result.correct);
        assert_eq!(result.next_url.as_deref(), Some("https://q/2"));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_incorrect_answer_keeps_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "correct": false,
                "reason": "Expected a number"
            })))
            .mount(&server)
            .await;

        let result = client(2_000)
            .submit(&server.uri(), &Answer::Text("four".into()), "https://q/1")
            .await;

        assert!(!result.correct);
        assert_eq!(result.reason.as_deref(), Some("Expected a number"));
    }

    #[tokio::test]
    async fn test_timeout_becomes_error_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"correct": true}))
                    .set_delay(Duration::from_millis(1_500)),
            )
            .mount(&server)
            .await;

        let result = client(100)
            .submit(&server.uri(), &Answer::Integer(1), "https://q/1")
            .await;

        assert!(!result.correct);
        assert!(!result.error.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_non_json_body_becomes_error_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let result = client(2_000)
            .submit(&server.uri(), &Answer::Bool(true), "https://q/1")
            .await;

        assert!(!result.correct);
        assert!(result.error.unwrap().contains("Non-JSON"));
    }

    #[tokio::test]
    async fn test_unreachable_host_becomes_error_result() {
        let result = client(500)
            .submit("http://127.0.0.1:9/submit", &Answer::Integer(1), "https://q/1")
            .await;

        assert!(!result.correct);
        assert!(result.error.is_some());
    }
}
