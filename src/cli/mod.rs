//! CLI module for quizloop.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// quizloop - autonomous quiz-chain solver
///
/// Renders quiz pages, works out each answer with a tool-calling model,
/// submits it and follows the chain until it ends.
#[derive(Parser, Debug)]
#[command(name = "quizloop")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP endpoint that accepts quiz tasks
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8000", env = "PORT")]
        port: u16,
    },

    /// Solve a quiz chain in the foreground
    Solve {
        /// URL of the first quiz page
        url: String,

        /// Override the configured step limit
        #[arg(long)]
        max_steps: Option<usize>,

        /// Override the configured retry count
        #[arg(long)]
        max_retries: Option<usize>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_solve() {
        let cli = Cli::parse_from(["quizloop", "-vv", "solve", "https://q/1", "--max-retries", "2"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Solve { url, max_steps, max_retries } => {
                assert_eq!(url, "https://q/1");
                assert_eq!(max_steps, None);
                assert_eq!(max_retries, Some(2));
            }
            other => panic!("Expected Solve, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::parse_from(["quizloop", "serve", "--port", "9000"]);
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, "0.0.0.0");
                assert_eq!(port, 9000);
            }
            other => panic!("Expected Serve, got {:?}", other),
        }
    }
}
