//! Image OCR through the `tesseract` binary.

use crate::error::{QuizError, Result};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, instrument};

/// Run tesseract on an image and return the recognized text.
#[instrument(skip(tesseract), fields(path = %path.display()))]
pub async fn ocr_image(path: &Path, lang: &str, tesseract: &str) -> Result<String> {
    if !path.exists() {
        return Err(QuizError::FileNotFound(path.display().to_string()));
    }

    let result = Command::new(tesseract)
        .arg(path)
        .arg("stdout")
        .arg("-l")
        .arg(lang)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(QuizError::ToolNotFound(tesseract.to_string()));
        }
        Err(e) => {
            return Err(QuizError::ToolFailed(format!("{} execution failed: {}", tesseract, e)));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(QuizError::ToolFailed(format!("{} failed: {}", tesseract, stderr.trim())));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    info!("OCR recognized {} chars", text.len());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_image() {
        let err = ocr_image(Path::new("/nonexistent/scan.png"), "eng", "tesseract")
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("scan.png");
        std::fs::write(&image, [0u8; 4]).unwrap();

        let err = ocr_image(&image, "eng", "tesseract-not-installed").await.unwrap_err();
        assert!(matches!(err, QuizError::ToolNotFound(_)));
    }
}
