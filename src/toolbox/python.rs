//! Python code execution and package installation.

use crate::error::{QuizError, Result};
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Returned in place of output when a script overruns its time limit.
pub const TIMEOUT_MESSAGE: &str = "Error: Code execution timed out.";

/// Run `code` with the given interpreter and return stdout, followed by
/// stderr under an `Errors:` header when the script wrote any.
///
/// The script is written to a temporary file under `temp_dir` and runs with
/// `work_dir` as its working directory, so relative paths to downloaded files
/// resolve. A script still running after `timeout` is killed.
#[instrument(skip(code, temp_dir, work_dir), fields(len = code.len()))]
pub async fn run_python_code(
    python: &str,
    code: &str,
    temp_dir: &Path,
    work_dir: &Path,
    timeout: Duration,
) -> Result<String> {
    std::fs::create_dir_all(temp_dir)?;
    let mut script = tempfile::Builder::new()
        .prefix("quiz_script_")
        .suffix(".py")
        .tempfile_in(temp_dir)?;
    script.write_all(code.as_bytes())?;
    script.flush()?;

    let spawned = Command::new(python)
        .arg(script.path())
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match spawned {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(QuizError::ToolNotFound(python.to_string()));
        }
        Err(e) => return Err(QuizError::ToolFailed(format!("{} execution failed: {}", python, e))),
    };

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => {
            warn!("Script exceeded {:?}, killed", timeout);
            return Ok(TIMEOUT_MESSAGE.to_string());
        }
    };

    debug!("Script exited with {}", output.status);

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        text.push_str("\nErrors:\n");
        text.push_str(&stderr);
    }
    Ok(text)
}

/// Install a package with `python -m pip install`.
#[instrument(skip(python))]
pub async fn install_package(python: &str, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() || name.starts_with('-') {
        return Err(QuizError::InvalidInput(format!("Invalid package name: {:?}", name)));
    }

    let result = Command::new(python)
        .args(["-m", "pip", "install", name])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(QuizError::ToolNotFound(python.to_string()));
        }
        Err(e) => return Err(QuizError::ToolFailed(format!("pip execution failed: {}", e))),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(QuizError::ToolFailed(format!("pip install {} failed: {}", name, stderr.trim())));
    }

    info!("Installed {}", name);
    Ok(format!("Successfully installed {}", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    // `sh` stands in for the interpreter: it takes the script path the same way.
    #[tokio::test]
    async fn test_stdout_and_stderr_are_combined() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_python_code(
            "sh",
            "echo 42\necho oops >&2\n",
            dir.path(),
            dir.path(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(out, "42\n\nErrors:\noops\n");
    }

    #[tokio::test]
    async fn test_runs_in_work_dir() {
        let temp = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        std::fs::write(work.path().join("data.txt"), "hello").unwrap();

        let out = run_python_code("sh", "cat data.txt", temp.path(), work.path(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_timeout_kills_script() {
        let dir = tempfile::tempdir().unwrap();
        let started = std::time::Instant::now();
        let out = run_python_code("sh", "sleep 10", dir.path(), dir.path(), Duration::from_millis(200))
            .await
            .unwrap();

        assert_eq!(out, TIMEOUT_MESSAGE);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_script_file_is_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        run_python_code("sh", "true", dir.path(), dir.path(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_python_code("python-not-here", "print(1)", dir.path(), dir.path(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn test_install_rejects_flags() {
        let err = install_package("python3", "--index-url=http://evil").await.unwrap_err();
        assert!(matches!(err, QuizError::InvalidInput(_)));
        assert!(install_package("python3", "  ").await.is_err());
    }
}
