//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::{RendererKind, Settings};
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

fn print_section(title: &str, checks: &[CheckResult]) {
    println!("{}", style(title).bold());
    for check in checks {
        check.print();
    }
    println!();
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: Option<&str>) -> anyhow::Result<()> {
    Output::header("quizloop doctor");
    println!();

    let mut checks = Vec::new();

    let tools = vec![
        check_tool("python", &settings.tools.python, "--version", "Install Python 3 and pandas"),
        check_optional_tool(
            "tesseract",
            &settings.tools.tesseract,
            "--version",
            "Needed for ocr_image. Install with your package manager (tesseract-ocr)",
        ),
        check_optional_tool(
            "pdftotext",
            &settings.tools.pdftotext,
            "-v",
            "Needed for PDF files. Install poppler-utils",
        ),
    ];
    print_section("External Tools", &tools);
    checks.extend(tools);

    let browser = vec![check_browser(settings)];
    print_section("Renderer", &browser);
    checks.extend(browser);

    let credentials = check_credentials(settings);
    print_section("Credentials", &credentials);
    checks.extend(credentials);

    let config = vec![check_config_file(config_path)];
    print_section("Configuration", &config);
    checks.extend(config);

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!("{} error(s) found. Fix them before solving quizzes.", errors));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed. Ready to solve quizzes.");
    }

    Ok(())
}

/// Run `<binary> <version_arg>` and report the first line of output.
fn check_tool(name: &str, binary: &str, version_arg: &str, hint: &str) -> CheckResult {
    match Command::new(binary).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            // Some tools print their version on stderr
            let text = if output.stdout.is_empty() {
                String::from_utf8_lossy(&output.stderr).into_owned()
            } else {
                String::from_utf8_lossy(&output.stdout).into_owned()
            };
            let version: String = text
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .chars()
                .take(50)
                .collect();
            CheckResult::ok(name, &version)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, &format!("{} not found", binary), hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Like `check_tool`, but a missing binary only disables one agent tool.
fn check_optional_tool(name: &str, binary: &str, version_arg: &str, hint: &str) -> CheckResult {
    let result = check_tool(name, binary, version_arg, hint);
    match result.status {
        CheckStatus::Error => CheckResult::warning(name, &result.message, hint),
        _ => result,
    }
}

fn check_browser(settings: &Settings) -> CheckResult {
    if settings.renderer.kind == RendererKind::Http {
        return CheckResult::ok("Renderer", "http (no JavaScript)");
    }

    if let Some(path) = &settings.renderer.chrome_executable {
        let expanded = Settings::expand_path(path);
        return if expanded.exists() {
            CheckResult::ok("Chromium", &expanded.display().to_string())
        } else {
            CheckResult::error(
                "Chromium",
                &format!("{} does not exist", expanded.display()),
                "Fix renderer.chrome_executable in the config file",
            )
        };
    }

    for candidate in ["chromium", "chromium-browser", "google-chrome", "google-chrome-stable"] {
        if let Ok(output) = Command::new(candidate).arg("--version").output() {
            if output.status.success() {
                return CheckResult::ok("Chromium", String::from_utf8_lossy(&output.stdout).trim());
            }
        }
    }

    CheckResult::error(
        "Chromium",
        "no Chrome/Chromium binary found",
        "Install Chromium, set renderer.chrome_executable, or use renderer.kind = \"http\"",
    )
}

fn check_credentials(settings: &Settings) -> Vec<CheckResult> {
    let key_env = &settings.llm.api_key_env;
    let api_key = match settings.llm.api_key() {
        Some(key) => CheckResult::ok(key_env, &format!("configured ({})", mask(&key))),
        None => CheckResult::error(key_env, "not set", &format!("Set with: export {}='...'", key_env)),
    };

    let email = if settings.quiz.email.is_empty() {
        CheckResult::error("QUIZ_EMAIL", "not set", "Set with: export QUIZ_EMAIL='you@example.com'")
    } else {
        CheckResult::ok("QUIZ_EMAIL", &settings.quiz.email)
    };

    let secret = if settings.quiz.secret.is_empty() {
        CheckResult::warning(
            "QUIZ_SECRET",
            "not set",
            "`serve` rejects every request without it. Set with: export QUIZ_SECRET='...'",
        )
    } else {
        CheckResult::ok("QUIZ_SECRET", "configured")
    };

    vec![api_key, email, secret]
}

fn check_config_file(config_path: Option<&str>) -> CheckResult {
    let path = config_path
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    if Path::new(&path).exists() {
        CheckResult::ok("Config file", &path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to override settings", path.display()),
        )
    }
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_optional_tool_downgrades_to_warning() {
        let result = check_optional_tool("tesseract", "quizloop-missing-ocr", "--version", "install");
        assert_eq!(result.status, CheckStatus::Warning);
        assert!(result.message.contains("not found"));
    }

    #[test]
    fn test_http_renderer_needs_no_browser() {
        let mut settings = Settings::default();
        settings.renderer.kind = RendererKind::Http;
        assert_eq!(check_browser(&settings).status, CheckStatus::Ok);
    }

    #[test]
    fn test_missing_secret_is_warning() {
        let mut settings = Settings::default();
        settings.quiz.email = "me@example.com".into();
        let checks = check_credentials(&settings);
        assert_eq!(checks[1].status, CheckStatus::Ok);
        assert_eq!(checks[2].status, CheckStatus::Warning);
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("sk-abcdefghijkl"), "sk-a...ijkl");
        assert_eq!(mask("short"), "****");
    }
}
