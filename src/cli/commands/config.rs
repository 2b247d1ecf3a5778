//! Config command implementation.

use crate::cli::ConfigAction;
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: &Settings, config_path: Option<&str>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", render_redacted(settings)?);
        }

        ConfigAction::Path => {
            let path = config_path
                .map(PathBuf::from)
                .unwrap_or_else(Settings::default_config_path);
            println!("{}", path.display());
        }
    }

    Ok(())
}

/// Settings as TOML with the shared secret masked.
fn render_redacted(settings: &Settings) -> Result<String> {
    let mut shown = settings.clone();
    if !shown.quiz.secret.is_empty() {
        shown.quiz.secret = "********".to_string();
    }
    toml::to_string_pretty(&shown).map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))
}
