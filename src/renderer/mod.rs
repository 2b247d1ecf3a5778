//! Page rendering: turn a quiz URL into the HTML the extractor reads.

mod chromium;
mod http;

pub use chromium::ChromiumRenderer;
pub use http::HttpRenderer;

use crate::config::{RendererKind, RendererSettings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Fetches a page and returns its HTML after any client-side scripts ran.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String>;
}

/// Create the renderer selected in settings.
pub fn create_renderer(settings: &RendererSettings) -> Result<Arc<dyn PageRenderer>> {
    match settings.kind {
        RendererKind::Chromium => Ok(Arc::new(ChromiumRenderer::new(settings.clone()))),
        RendererKind::Http => Ok(Arc::new(HttpRenderer::new(settings)?)),
    }
}
