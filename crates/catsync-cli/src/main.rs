//! # catsync CLI entry point
//!
//! Parses command-line arguments, installs logging, and hands off to
//! [`catsync_cli::run`].

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use catsync_cli::logging::{self, LogTag};
use catsync_cli::settings::PASSWORD_ENV;
use catsync_cli::{history, EXIT_CONFIG};

/// Provision Prism Central categories and Flow security rules.
///
/// Reads a YAML settings file, upserts every category key and value it
/// lists, and creates one security rule per category value.
#[derive(Parser, Debug)]
#[command(name = "catsync", version, about, long_about = None)]
struct Cli {
    /// Path to the YAML settings file.
    #[arg(short, long, required_unless_present = "history")]
    config: Option<PathBuf>,

    /// Also append log lines to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log request-level detail.
    #[arg(short, long)]
    debug: bool,

    /// Print the release history and exit.
    #[arg(long)]
    history: bool,
}

fn main() -> ExitCode {
    // Usage errors are setup errors: exit 1, not clap's default 2.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_CONFIG)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if cli.history {
        println!("{}", history::render());
        return ExitCode::SUCCESS;
    }

    if let Err(e) = logging::init(cli.debug, cli.log_file.as_deref()) {
        eprintln!("{e:#}");
        return ExitCode::from(EXIT_CONFIG);
    }

    tracing::debug!(tag = %LogTag::Debug, "catsync {} starting", env!("CARGO_PKG_VERSION"));

    let Some(config) = cli.config else {
        tracing::error!(tag = %LogTag::Error, "--config is required");
        return ExitCode::from(EXIT_CONFIG);
    };

    let env_password = std::env::var(PASSWORD_ENV).ok();
    ExitCode::from(catsync_cli::run(&config, env_password))
}
