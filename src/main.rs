//! quizloop CLI entry point.

use anyhow::Result;
use clap::Parser;
use quizloop::cli::{commands, Cli, Commands};
use quizloop::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    // -v flags win over the configured level; RUST_LOG wins over both
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("quizloop={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match &cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Solve {
            url,
            max_steps,
            max_retries,
        } => {
            commands::run_solve(url, *max_steps, *max_retries, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, cli.config.as_deref())?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &settings, cli.config.as_deref())?;
        }
    }

    Ok(())
}
