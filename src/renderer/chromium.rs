//! Headless Chromium renderer using chromiumoxide.

use super::PageRenderer;
use crate::config::RendererSettings;
use crate::error::{QuizError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Renders pages in a fresh headless Chromium per call.
///
/// Quiz pages decode their question in JavaScript, so the returned HTML is
/// the live DOM after the load event plus a short settle delay.
pub struct ChromiumRenderer {
    settings: RendererSettings,
}

impl ChromiumRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .new_headless_mode()
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");

        if let Some(path) = &self.settings.chrome_executable {
            builder = builder.chrome_executable(PathBuf::from(shellexpand::tilde(path).to_string()));
        }

        builder
            .build()
            .map_err(|e| QuizError::Render(format!("Failed to build browser config: {}", e)))
    }

    async fn load(&self, browser: &Browser, url: &str) -> Result<String> {
        let page = browser
            .new_page(url)
            .await
            .map_err(|e| QuizError::Render(format!("Navigation to {} failed: {}", url, e)))?;

        if let Err(e) = page.wait_for_navigation().await {
            debug!("wait_for_navigation: {}", e);
        }
        tokio::time::sleep(Duration::from_millis(self.settings.settle_millis)).await;

        let html = page
            .content()
            .await
            .map_err(|e| QuizError::Render(format!("Failed to read page content: {}", e)))?;

        if let Err(e) = page.close().await {
            debug!("Page close failed: {}", e);
        }
        Ok(html)
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    #[instrument(skip(self))]
    async fn render(&self, url: &str) -> Result<String> {
        let config = self.browser_config()?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| QuizError::Render(format!("Failed to launch Chromium: {}", e)))?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let timeout = Duration::from_secs(self.settings.navigation_timeout_seconds);
        let result = match tokio::time::timeout(timeout, self.load(&browser, url)).await {
            Ok(result) => result,
            Err(_) => Err(QuizError::Render(format!(
                "Rendering {} timed out after {}s",
                url, self.settings.navigation_timeout_seconds
            ))),
        };

        if let Err(e) = browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        match browser.wait().await {
            Ok(status) => debug!("Browser exited: {:?}", status),
            Err(e) => debug!("Browser wait failed: {}", e),
        }
        events.abort();

        if let Ok(html) = &result {
            info!("Rendered {} ({} bytes)", url, html.len());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_browser_is_render_error() {
        let renderer = ChromiumRenderer::new(RendererSettings {
            chrome_executable: Some("/nonexistent/chrome".to_string()),
            navigation_timeout_seconds: 5,
            ..Default::default()
        });

        let err = renderer.render("about:blank").await.unwrap_err();
        assert!(matches!(err, QuizError::Render(_)));
    }
}
