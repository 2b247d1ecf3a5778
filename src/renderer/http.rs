//! Plain HTTP renderer for pages that need no JavaScript.

use super::PageRenderer;
use crate::config::RendererSettings;
use crate::error::{QuizError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, instrument};

/// Fetches the raw HTML with a GET request.
pub struct HttpRenderer {
    http: reqwest::Client,
}

impl HttpRenderer {
    pub fn new(settings: &RendererSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.navigation_timeout_seconds))
            .build()
            .map_err(|e| QuizError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    #[instrument(skip(self))]
    async fn render(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| QuizError::Render(format!("Request to {} failed: {}", url, e)))?
            .error_for_status()
            .map_err(|e| QuizError::Render(e.to_string()))?;

        let html = response.text().await?;
        info!("Fetched {} ({} bytes)", url, html.len());
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetches_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/quiz/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Q1</h1>"))
            .mount(&server)
            .await;

        let renderer = HttpRenderer::new(&RendererSettings::default()).unwrap();
        let html = renderer.render(&format!("{}/quiz/1", server.uri())).await.unwrap();
        assert_eq!(html, "<h1>Q1</h1>");
    }

    #[tokio::test]
    async fn test_http_error_is_render_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let renderer = HttpRenderer::new(&RendererSettings::default()).unwrap();
        let err = renderer.render(&server.uri()).await.unwrap_err();
        assert!(matches!(err, QuizError::Render(_)));
    }
}
