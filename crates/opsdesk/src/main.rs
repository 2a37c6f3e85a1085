// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opsdesk - support conversation router and ticket lifecycle bot.
//!
//! This is the binary entry point.

mod seed;
mod serve;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Opsdesk - support conversation router and ticket lifecycle bot.
#[derive(Parser, Debug)]
#[command(name = "opsdesk", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot (long polling + liveness endpoint).
    Serve,
    /// Provision the default client and project if the store is empty.
    Seed,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match opsdesk_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            opsdesk_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Some(Commands::Serve) | None => serve::run(config).await,
        Some(Commands::Seed) => seed::run(&config).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "fatal error");
        eprintln!("opsdesk: {e}");
        std::process::exit(1);
    }
}
