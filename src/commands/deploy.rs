//! Deploy command implementation
//!
//! Opens the unit store, runs one deployment pass with the loaded settings
//! and prints what the pass did. Unit failures are reported, not fatal.

use std::path::PathBuf;
use std::sync::Arc;

use console::Style;

use crate::cli::DeployArgs;
use crate::config::{DEPLOY_DIR_KEY, Settings};
use crate::error::Result;
use crate::installer::ArchiveInstaller;
use crate::planner::{DeployReport, Deployer};
use crate::progress::ProgressDisplay;
use crate::registry::FsRegistry;
use crate::source::{ArtifactSource, UrlSource};

/// Run deploy command
pub fn run(store: Option<PathBuf>, config: Option<PathBuf>, args: DeployArgs) -> Result<()> {
    let mut settings = super::load_settings(config)?;
    apply_overrides(&mut settings, args.deploy_dir, args.proxy_auth);

    let source: Arc<dyn ArtifactSource> = Arc::new(UrlSource::new(settings.proxy_auth.clone()));
    let mut registry = FsRegistry::open(&super::store_path(store), Arc::clone(&source))?;
    let installer = ArchiveInstaller::new(source);

    let mut progress = if args.json {
        ProgressDisplay::hidden()
    } else {
        ProgressDisplay::new()
    };
    let report = Deployer::new(&mut registry, &installer, &mut progress).process(&settings);
    progress.finish();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Command line values take precedence over the settings file
fn apply_overrides(
    settings: &mut Settings,
    deploy_dir: Option<PathBuf>,
    proxy_auth: Option<String>,
) {
    if let Some(dir) = deploy_dir {
        settings
            .properties
            .insert(DEPLOY_DIR_KEY.to_string(), dir.display().to_string());
    }
    if proxy_auth.is_some() {
        settings.proxy_auth = proxy_auth;
    }
}

fn print_report(report: &DeployReport) {
    let sections = [
        ("Installed", &report.installed, Style::new().green()),
        ("Updated", &report.updated, Style::new().cyan()),
        ("Uninstalled", &report.uninstalled, Style::new().yellow()),
        ("Started", &report.started, Style::new().green()),
        ("Failed", &report.failed, Style::new().red()),
    ];

    let mut printed = false;
    for (title, names, style) in sections {
        if names.is_empty() {
            continue;
        }
        printed = true;
        println!(
            "{} ({}):",
            Style::new().bold().apply_to(title),
            names.len()
        );
        for name in names {
            println!("  {}", style.apply_to(name));
        }
    }

    if !printed {
        println!("Nothing to deploy.");
    }
    if !report.is_clean() {
        println!();
        println!(
            "{} Some units failed, run with --verbose for details",
            Style::new().bold().red().apply_to("Warning:")
        );
    }
}
