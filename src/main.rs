//! Autodeploy - module registry reconciler
//!
//! Converges a unit store to the unit archives found in a deploy directory
//! and to the units declared under `auto.install` / `auto.start` properties.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod error;
mod installer;
mod location;
mod planner;
mod progress;
mod registry;
mod source;

#[cfg(test)]
mod test_fixtures;

use cli::{Cli, Commands};

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "AUTODEPLOY_LOG";

/// Log to stderr so listings and reports stay clean on stdout
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Deploy(args) => commands::deploy::run(cli.store, cli.config, args),
        Commands::List(args) => commands::list::run(cli.store, args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
