//! Base64 encoding of local files into the placeholder store.

use crate::error::{QuizError, Result};
use crate::placeholder::PlaceholderStore;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;
use tracing::info;

/// Encode a file as base64, park it in `store` and return the placeholder key.
///
/// The payload never enters the model context; only the short key does.
pub async fn encode_file_to_placeholder(path: &Path, store: &PlaceholderStore) -> Result<String> {
    if !path.exists() {
        return Err(QuizError::FileNotFound(path.display().to_string()));
    }

    let bytes = tokio::fs::read(path).await?;
    let encoded = STANDARD.encode(&bytes);
    let key = store.insert(encoded);

    info!("Encoded {} ({} bytes) as {}", path.display(), bytes.len(), key);
    Ok(key)
}
