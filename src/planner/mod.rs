//! Deployment planning
//!
//! A deployment pass converges the registry to the declared units in two
//! independent steps, run in order against the same registry:
//!
//! 1. [`directory`]: archives found in the deploy directory, matched by location
//! 2. [`configuration`]: units listed under `auto.install` / `auto.start`
//!    keys, matched by logical name, with [`translation`] add-ons kept in step.
//!    It removes every unit it does not find declared, including the units of
//!    the directory step, unless the settings ask for `directory_only`.
//!
//! Each step reads a [`RegistrySnapshot`](crate::registry::RegistrySnapshot)
//! once, computes its plan with pure functions and then applies it. A unit
//! that fails is logged and skipped; nothing stops the rest of the pass.

pub mod configuration;
pub mod directory;
pub mod translation;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::Settings;
use crate::installer::ArchiveInstaller;
use crate::progress::ProgressSink;
use crate::registry::UnitRegistry;

/// What a deployment pass did, by logical name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub installed: Vec<String>,
    pub updated: Vec<String>,
    pub uninstalled: Vec<String>,
    pub started: Vec<String>,
    pub failed: Vec<String>,
}

impl DeployReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applies deployment plans to a registry
pub struct Deployer<'a> {
    registry: &'a mut dyn UnitRegistry,
    installer: &'a ArchiveInstaller,
    progress: &'a mut dyn ProgressSink,
    report: DeployReport,
}

impl<'a> Deployer<'a> {
    pub fn new(
        registry: &'a mut dyn UnitRegistry,
        installer: &'a ArchiveInstaller,
        progress: &'a mut dyn ProgressSink,
    ) -> Self {
        Self {
            registry,
            installer,
            progress,
            report: DeployReport::default(),
        }
    }

    /// Run the directory step, then the configuration step
    pub fn process(mut self, settings: &Settings) -> DeployReport {
        let dir = settings.deploy_dir();
        self.deploy_directory(&dir, settings.deploy_actions(), settings.deploy_tier());
        if settings.directory_only {
            debug!("configuration step disabled by directory_only");
        } else {
            self.deploy_configuration(
                &settings.properties,
                settings.translations.as_ref(),
                &settings.native_variant(),
            );
        }

        info!(
            installed = self.report.installed.len(),
            updated = self.report.updated.len(),
            uninstalled = self.report.uninstalled.len(),
            started = self.report.started.len(),
            failed = self.report.failed.len(),
            "deployment pass finished"
        );
        self.report
    }

    /// Report collected so far
    pub fn into_report(self) -> DeployReport {
        self.report
    }
}
