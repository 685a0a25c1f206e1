// SPDX-FileCopyrightText: 2026 Arcanum Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Arcanum - a command-line tarot reading client.
//!
//! This is the binary entry point. Orchestration lives in the library
//! crates; this binary loads configuration, sets up tracing, and dispatches
//! subcommands.

use std::path::PathBuf;
use std::sync::Arc;

use arcanum_config::ArcanumConfig;
use arcanum_gateway::ServiceGateway;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod layouts;
mod read;

/// Arcanum - tarot readings from the command line.
#[derive(Parser, Debug)]
#[command(name = "arcanum", version, about, long_about = None)]
struct Cli {
    /// Path to an explicit config file (bypasses the XDG hierarchy).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List the available spread layouts.
    Layouts,
    /// Run a reading: pick a layout, draw cards, wait for the
    /// interpretation, then ask follow-up questions.
    Read {
        /// Layout id to use (prompted from the catalog when omitted).
        #[arg(long)]
        layout: Option<String>,
        /// Optional question to focus the reading.
        #[arg(long)]
        question: Option<String>,
        /// Resume an existing reading instead of creating a new one.
        #[arg(long)]
        resume: Option<String>,
    },
    /// Print the effective merged configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            arcanum_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    let result = match cli.command {
        Commands::Layouts => layouts::run(&config).await,
        Commands::Read {
            layout,
            question,
            resume,
        } => read::run(&config, layout, question, resume).await,
        Commands::Config => {
            match toml::to_string_pretty(&config) {
                Ok(rendered) => {
                    print!("{rendered}");
                    Ok(())
                }
                Err(e) => Err(arcanum_core::ArcanumError::Internal(format!(
                    "failed to render config: {e}"
                ))),
            }
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn load_config(
    path: Option<&std::path::Path>,
) -> Result<ArcanumConfig, Vec<arcanum_config::ConfigError>> {
    match path {
        Some(path) => arcanum_config::load_and_validate_path(path),
        None => arcanum_config::load_and_validate(),
    }
}

fn init_tracing(config: &ArcanumConfig) {
    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.client.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the shared gateway from config.
pub(crate) fn gateway(
    config: &ArcanumConfig,
) -> Result<Arc<ServiceGateway>, arcanum_core::ArcanumError> {
    Ok(Arc::new(ServiceGateway::new(&config.services)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_subcommand_parses_all_flags() {
        let cli = Cli::parse_from([
            "arcanum", "read", "--layout", "three-card", "--question", "What next?",
        ]);
        match cli.command {
            Commands::Read {
                layout, question, resume,
            } => {
                assert_eq!(layout.as_deref(), Some("three-card"));
                assert_eq!(question.as_deref(), Some("What next?"));
                assert_eq!(resume, None);
            }
            other => panic!("expected Read, got {other:?}"),
        }
    }

    #[test]
    fn resume_flag_carries_the_reading_id() {
        let cli = Cli::parse_from(["arcanum", "read", "--resume", "r-42"]);
        match cli.command {
            Commands::Read { resume, .. } => assert_eq!(resume.as_deref(), Some("r-42")),
            other => panic!("expected Read, got {other:?}"),
        }
    }

    #[test]
    fn global_config_flag_is_accepted() {
        let cli = Cli::parse_from(["arcanum", "layouts", "--config", "/tmp/arcanum.toml"]);
        assert_eq!(
            cli.config.as_deref(),
            Some(std::path::Path::new("/tmp/arcanum.toml"))
        );
    }
}
