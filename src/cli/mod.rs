//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - deploy: Deploy command arguments
//! - list: List command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod completions;
pub mod deploy;
pub mod list;

pub use completions::CompletionsArgs;
pub use deploy::DeployArgs;
pub use list::ListArgs;

/// Autodeploy - module registry reconciler
///
/// Converge a unit store to the archives of a deploy directory and the units
/// declared in a settings file.
#[derive(Parser, Debug)]
#[command(
    name = "autodeploy",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Converge a module registry to declared units",
    long_about = "Autodeploy installs, updates, uninstalls and starts units in a unit store so that \
                  it matches the archives of a deploy directory and the auto.install / auto.start \
                  properties of a settings file.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  autodeploy deploy                        \x1b[90m# Deploy using ./autodeploy.yaml\x1b[0m\n   \
                  autodeploy deploy -c units.yaml          \x1b[90m# Deploy using another settings file\x1b[0m\n   \
                  autodeploy deploy --deploy-dir ./bundle  \x1b[90m# Override the deploy directory\x1b[0m\n   \
                  autodeploy list                          \x1b[90m# List installed units\x1b[0m\n   \
                  autodeploy list --json                   \x1b[90m# List installed units as JSON\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Unit store directory (defaults to the user data directory)
    #[arg(long, short = 's', global = true, env = "AUTODEPLOY_STORE")]
    pub store: Option<PathBuf>,

    /// Settings file (defaults to ./autodeploy.yaml when present)
    #[arg(long, short = 'c', global = true, env = "AUTODEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a deployment pass against the unit store
    Deploy(DeployArgs),

    /// List installed units
    List(ListArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
