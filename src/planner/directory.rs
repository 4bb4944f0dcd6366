//! Directory deployment
//!
//! Converges the registry to the unit archives found directly inside the
//! deploy directory. Archives are matched to installed units by exact
//! location, visited in file name order, and handled according to the
//! configured [`ActionSet`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::Deployer;
use crate::config::{Action, ActionSet};
use crate::error::cause_chain;
use crate::location::ARCHIVE_EXTENSION;
use crate::registry::{RegistrySnapshot, Unit};
use crate::source::file_location;

/// What to do with one archive of the deploy directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAction {
    /// Not installed yet: install it
    Install,
    /// Installed: refresh it from its location
    Update(Unit),
    /// Installed and left as is
    Keep(Unit),
    /// Not installed and installing is disabled
    Skip,
}

/// One archive of the deploy directory and its planned action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub file_name: String,
    pub location: String,
    pub action: FileAction,
}

/// Actions for one directory pass, in application order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryPlan {
    pub files: Vec<PlannedFile>,
    /// Installed units with no archive in the directory, to uninstall
    pub stale: Vec<Unit>,
}

/// Unit archives directly inside `dir`, sorted by file name.
///
/// A missing or unreadable directory has no archives.
pub fn list_archives(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .ends_with(ARCHIVE_EXTENSION)
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Plan a directory pass.
///
/// `archives` must already be in application order.
pub fn plan_directory(
    archives: &[PathBuf],
    snapshot: &RegistrySnapshot,
    actions: ActionSet,
) -> DirectoryPlan {
    let mut live = snapshot.by_location();
    let mut files = Vec::with_capacity(archives.len());

    for archive in archives {
        let location = file_location(archive);
        let file_name = archive
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| location.clone());

        let action = match live.remove(&location) {
            None if actions.contains(Action::Install) => FileAction::Install,
            None => FileAction::Skip,
            Some(unit) if actions.contains(Action::Update) => FileAction::Update(unit),
            Some(unit) => FileAction::Keep(unit),
        };
        files.push(PlannedFile {
            file_name,
            location,
            action,
        });
    }

    let stale = if actions.contains(Action::Uninstall) {
        stale_units(live)
    } else {
        Vec::new()
    };

    DirectoryPlan { files, stale }
}

fn stale_units(live: HashMap<String, Unit>) -> Vec<Unit> {
    let mut stale: Vec<Unit> = live.into_values().filter(|unit| !unit.is_root()).collect();
    stale.sort_by_key(|unit| unit.id);
    stale
}

impl Deployer<'_> {
    /// Deploy the archives of `dir` with the given actions.
    ///
    /// Units found or installed are assigned `tier`, or the registry default
    /// when no tier is configured.
    pub fn deploy_directory(&mut self, dir: &Path, actions: ActionSet, tier: Option<i32>) {
        if actions.is_empty() {
            debug!("no deploy actions configured, skipping {}", dir.display());
            return;
        }

        let snapshot = match RegistrySnapshot::capture(&*self.registry) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Auto-deploy: cannot list installed units: {}", cause_chain(&e));
                return;
            }
        };
        let tier = tier.unwrap_or_else(|| self.registry.default_tier());
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let plan = plan_directory(&list_archives(&dir), &snapshot, actions);
        info!(
            "Auto-deploy {} ({}): {} archive(s)",
            dir.display(),
            actions,
            plan.files.len()
        );

        self.progress.set_max(plan.files.len());
        let mut to_start = Vec::new();
        for (index, file) in plan.files.into_iter().enumerate() {
            self.progress
                .write_label(&format!("Downloading {}", file.file_name));
            if let Some(unit) = self.apply_file(file) {
                if !unit.fragment {
                    if let Err(e) = self.registry.set_tier(&unit, tier) {
                        warn!("Auto-deploy tier: {}", cause_chain(&e));
                    }
                    to_start.push(unit);
                }
            }
            self.progress.set_value(index + 1);
        }

        for unit in plan.stale {
            let name = unit.logical_name();
            match self.registry.uninstall(&unit) {
                Ok(()) => self.report.uninstalled.push(name),
                Err(e) => {
                    warn!("Auto-deploy uninstall: {}", cause_chain(&e));
                    self.report.failed.push(name);
                }
            }
        }

        if actions.contains(Action::Start) {
            for unit in to_start {
                let name = unit.logical_name();
                match self.registry.start(&unit) {
                    Ok(()) => self.report.started.push(name),
                    Err(e) => {
                        warn!("Auto-deploy start: {}", cause_chain(&e));
                        self.report.failed.push(name);
                    }
                }
            }
        }
    }

    /// Apply one planned file, returning the unit it resolved to
    fn apply_file(&mut self, file: PlannedFile) -> Option<Unit> {
        let name = crate::location::logical_name(&file.location);
        let outcome = match file.action {
            FileAction::Install => self
                .installer
                .install(&mut *self.registry, &file.location)
                .map(|unit| {
                    self.report.installed.push(name.clone());
                    Some(unit)
                }),
            FileAction::Update(unit) => self.registry.update(&unit).map(|unit| {
                self.report.updated.push(name.clone());
                Some(unit)
            }),
            FileAction::Keep(unit) => Ok(Some(unit)),
            FileAction::Skip => Ok(None),
        };

        match outcome {
            Ok(unit) => unit,
            Err(e) => {
                warn!("Auto-deploy install: {}", cause_chain(&e));
                self.report.failed.push(name);
                None
            }
        }
    }
}
