//! Translation add-ons
//!
//! A unit with symbolic name `core` may have a translation add-on named
//! `core-i18n-2.0.0.jar` hosted under the configured base location. The
//! catalog maps add-on file names to the version qualifier that should be
//! installed; a different qualifier means the add-on has to be refreshed.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::Deployer;
use crate::config::TranslationSettings;
use crate::error::{Result, cause_chain};
use crate::location::{self, ARCHIVE_EXTENSION};
use crate::registry::Unit;

/// Version in every add-on file name; the qualifier carries the real version
pub const ADDON_VERSION: &str = "2.0.0";

/// File name of the translation add-on for a unit
pub fn addon_file_name(symbolic_name: &str) -> String {
    format!("{symbolic_name}-i18n-{ADDON_VERSION}{ARCHIVE_EXTENSION}")
}

/// Location of an add-on file under `base`
pub fn addon_location(base: &str, file_name: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{file_name}")
    } else {
        format!("{base}/{file_name}")
    }
}

/// Logical names of the catalog add-ons belonging to `parents`
pub fn addon_names<'u>(
    settings: &TranslationSettings,
    parents: impl IntoIterator<Item = &'u Unit>,
) -> HashSet<String> {
    parents
        .into_iter()
        .map(|unit| addon_file_name(&unit.symbolic_name))
        .filter(|file_name| settings.catalog.contains_key(file_name))
        .map(|file_name| location::logical_name(&file_name))
        .collect()
}

impl Deployer<'_> {
    /// Bring the translation add-on of `unit` in line with the catalog.
    ///
    /// Failures are logged and never stop the pass.
    pub(super) fn sync_translation(
        &mut self,
        unit: &Unit,
        settings: &TranslationSettings,
        index: &mut HashMap<String, Unit>,
    ) {
        let file_name = addon_file_name(&unit.symbolic_name);
        let Some(expected) = settings.catalog.get(&file_name) else {
            return;
        };
        let addon_location = addon_location(&settings.base, &file_name);
        let name = location::logical_name(&file_name);

        if let Err(e) = self.apply_translation(&name, &addon_location, expected, &settings.base, index)
        {
            warn!(
                "Cannot install translation pack {}: {}",
                addon_location,
                cause_chain(&e)
            );
            self.report.failed.push(name);
        }
    }

    fn apply_translation(
        &mut self,
        name: &str,
        addon_location: &str,
        expected: &str,
        base: &str,
        index: &mut HashMap<String, Unit>,
    ) -> Result<()> {
        let addon = match index.get(name) {
            Some(addon) => addon.clone(),
            None => {
                let addon = self.registry.install(addon_location, None)?;
                self.report.installed.push(name.to_string());
                index.insert(name.to_string(), addon.clone());
                addon
            }
        };

        if addon.version.qualifier == expected {
            debug!("translation pack {} is up to date", name);
            return Ok(());
        }

        let refreshed = if addon.location.starts_with(base) {
            let updated = self.registry.update(&addon)?;
            self.report.updated.push(name.to_string());
            updated
        } else {
            // same add-on served from another location
            self.registry.uninstall(&addon)?;
            index.remove(name);
            self.report.uninstalled.push(name.to_string());
            let reinstalled = self.registry.install(addon_location, None)?;
            self.report.installed.push(name.to_string());
            reinstalled
        };
        index.insert(name.to_string(), refreshed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installer::ArchiveInstaller;
    use crate::planner::DeployReport;
    use crate::registry::Version;
    use crate::test_fixtures::{Call, FakeRegistry, MemorySource, RecordingProgress};
    use indexmap::IndexMap;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    const BASE: &str = "https://host/i18n";

    fn settings(catalog: &[(&str, &str)]) -> TranslationSettings {
        TranslationSettings {
            base: BASE.to_string(),
            catalog: catalog
                .iter()
                .map(|(file, qualifier)| ((*file).to_string(), (*qualifier).to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn deploy(registry: &mut FakeRegistry, settings: &TranslationSettings) -> DeployReport {
        let properties: IndexMap<String, String> =
            IndexMap::from([("auto.start".to_string(), "file:/opt/core-1.0.jar".to_string())]);
        let installer = ArchiveInstaller::new(Arc::new(MemorySource::new()));
        let mut progress = RecordingProgress::default();
        let mut deployer = Deployer::new(registry, &installer, &mut progress);
        deployer.deploy_configuration(&properties, Some(settings), "");
        deployer.into_report()
    }

    /// Registry with `core-1.0` and its add-on installed at `location`
    fn with_addon(location: &str, qualifier: &str) -> FakeRegistry {
        let mut registry = FakeRegistry::new()
            .with_unit("file:/opt/core-1.0.jar", "1.0")
            .with_unit(location, "2.0.0");
        if let Some(addon) = registry.units.last_mut() {
            addon.version = Version::parse(&format!("2.0.0.{qualifier}"));
        }
        registry
    }

    #[test]
    fn test_addon_file_name() {
        assert_eq!(addon_file_name("core"), "core-i18n-2.0.0.jar");
    }

    #[test]
    fn test_addon_location_joins_with_single_slash() {
        assert_eq!(
            addon_location("https://host/i18n", "a.jar"),
            "https://host/i18n/a.jar"
        );
        assert_eq!(
            addon_location("https://host/i18n/", "a.jar"),
            "https://host/i18n/a.jar"
        );
    }

    #[test]
    fn test_addon_names_only_for_parents_in_catalog() {
        let registry = FakeRegistry::new()
            .with_unit("file:/opt/core-1.0.jar", "1.0")
            .with_unit("file:/opt/plain-1.0.jar", "1.0");

        let names = addon_names(
            &settings(&[("core-i18n-2.0.0.jar", "1"), ("gone-i18n-2.0.0.jar", "1")]),
            &registry.units,
        );

        assert_eq!(names, HashSet::from(["core-i18n-2.0.0".to_string()]));
    }

    #[test]
    fn test_addon_of_undeclared_unit_is_uninstalled() {
        let mut registry = FakeRegistry::new()
            .with_unit("file:/opt/gone-1.0.jar", "1.0")
            .with_unit("https://host/i18n/gone-i18n-2.0.0.jar", "2.0.0");

        let report = deploy(&mut registry, &settings(&[("gone-i18n-2.0.0.jar", "")]));

        assert_eq!(registry.names(), vec!["core-1.0"]);
        assert_eq!(report.uninstalled, vec!["gone-1.0", "gone-i18n-2.0.0"]);
    }

    #[test]
    fn test_addon_of_declared_unit_is_not_churned() {
        let mut registry = with_addon("https://host/i18n/core-i18n-2.0.0.jar", "20240101");

        let report = deploy(
            &mut registry,
            &settings(&[("core-i18n-2.0.0.jar", "20240101"), ("gone-i18n-2.0.0.jar", "1")]),
        );

        assert!(!registry.calls.contains(&Call::Uninstall("core-i18n-2.0.0".to_string())));
        assert!(report.uninstalled.is_empty());
    }

    #[test]
    fn test_missing_addon_is_installed() {
        let mut registry = FakeRegistry::new();

        let report = deploy(&mut registry, &settings(&[("core-i18n-2.0.0.jar", "")]));

        assert_eq!(
            registry.installed_locations(),
            vec![
                "file:/opt/core-1.0.jar",
                "https://host/i18n/core-i18n-2.0.0.jar"
            ]
        );
        assert_eq!(report.installed, vec!["core-1.0", "core-i18n-2.0.0"]);
        assert!(report.updated.is_empty());
    }

    #[test]
    fn test_unit_without_catalog_entry_has_no_addon() {
        let mut registry = FakeRegistry::new();

        deploy(&mut registry, &settings(&[("other-i18n-2.0.0.jar", "1")]));

        assert_eq!(registry.installed_locations(), vec!["file:/opt/core-1.0.jar"]);
    }

    #[test]
    fn test_current_addon_is_left_alone() {
        let mut registry = with_addon("https://host/i18n/core-i18n-2.0.0.jar", "20240101");

        let report = deploy(
            &mut registry,
            &settings(&[("core-i18n-2.0.0.jar", "20240101")]),
        );

        assert!(registry.installed_locations().is_empty());
        assert!(!registry.touched("core-i18n-2.0.0"));
        assert!(report.uninstalled.is_empty());
    }

    #[test]
    fn test_outdated_addon_under_base_is_updated() {
        let mut registry = with_addon("https://host/i18n/core-i18n-2.0.0.jar", "20230101");

        let report = deploy(
            &mut registry,
            &settings(&[("core-i18n-2.0.0.jar", "20240101")]),
        );

        assert!(registry.calls.contains(&Call::Update("core-i18n-2.0.0".to_string())));
        assert_eq!(report.updated, vec!["core-i18n-2.0.0"]);
    }

    #[test]
    fn test_outdated_addon_elsewhere_is_replaced() {
        let mut registry = with_addon("https://mirror/core-i18n-2.0.0.jar", "20230101");

        let report = deploy(
            &mut registry,
            &settings(&[("core-i18n-2.0.0.jar", "20240101")]),
        );

        assert!(registry.calls.contains(&Call::Uninstall("core-i18n-2.0.0".to_string())));
        assert_eq!(
            registry.installed_locations(),
            vec!["https://host/i18n/core-i18n-2.0.0.jar"]
        );
        assert_eq!(report.installed, vec!["core-i18n-2.0.0"]);
        assert!(report.is_clean());
    }

    #[test]
    fn test_addon_failure_does_not_fail_the_unit() {
        let mut registry = FakeRegistry::new().failing_install("core-i18n-2.0.0");

        let report = deploy(&mut registry, &settings(&[("core-i18n-2.0.0.jar", "1")]));

        assert_eq!(registry.started(), vec!["core-1.0"]);
        assert_eq!(report.failed, vec!["core-i18n-2.0.0"]);
    }
}
