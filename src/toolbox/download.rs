//! File download into the working directory.

use crate::error::{QuizError, Result};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

/// Fallback name when a URL has no usable last path segment.
const DEFAULT_FILE_NAME: &str = "download.bin";

/// Downloads `url` into `dest_dir`, streaming the body to disk.
///
/// The file is named after the last path segment of the URL, without query
/// string. An existing file of the same name is overwritten.
#[instrument(skip(client, dest_dir))]
pub async fn download_file(client: &reqwest::Client, url: &str, dest_dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dest_dir).await?;

    let path = dest_dir.join(file_name_from_url(url));

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| QuizError::Download(e.to_string()))?;

    let mut file = tokio::fs::File::create(&path).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        written += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    info!("Downloaded {} bytes to {}", written, path.display());
    Ok(path)
}

/// Derive a local file name from the last path segment of a URL.
pub fn file_name_from_url(url: &str) -> String {
    let segment = match url::Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or("")
            .to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .rsplit('/')
            .next()
            .unwrap_or("")
            .to_string(),
    };

    // Keep the write inside the download directory
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
        DEFAULT_FILE_NAME.to_string()
    } else {
        segment
    }
}
