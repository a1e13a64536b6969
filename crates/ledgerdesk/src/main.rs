// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ledgerdesk - operator console for an AI billing agent.
//!
//! This is the binary entry point.

mod console;
mod dashboard;
mod overlay;
mod render;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;

use ledgerdesk_config::LedgerdeskConfig;

/// Ledgerdesk - operator console for an AI billing agent.
#[derive(Parser, Debug)]
#[command(name = "ledgerdesk", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Open the interactive console (default).
    Console,
    /// Fetch the dashboard sources once and print them.
    Dashboard {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ledgerdesk={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> LedgerdeskConfig {
    let loaded = match path {
        Some(path) => ledgerdesk_config::load_and_validate_path(path),
        None => ledgerdesk_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            ledgerdesk_config::render_errors(&errors);
            std::process::exit(2);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    init_tracing(&config.console.log_level);

    let result = match cli.command.unwrap_or(Commands::Console) {
        Commands::Console => {
            let cancel = shutdown::install_signal_handler();
            console::run_console(config, cancel).await
        }
        Commands::Dashboard { json } => dashboard::run_dashboard(&config, json).await,
        Commands::Config => {
            match toml::to_string_pretty(&config) {
                Ok(rendered) => print!("{rendered}"),
                Err(e) => {
                    eprintln!("{}: failed to render config: {e}", "error".red());
                    std::process::exit(1);
                }
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}
