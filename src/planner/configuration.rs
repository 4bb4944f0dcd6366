//! Configuration deployment
//!
//! Converges the registry to the units declared under `auto.install[.N]`
//! and `auto.start[.N]` properties. Declared and installed units are matched
//! by logical name, so a unit moved to another location is not downloaded
//! again.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use super::{Deployer, translation};
use crate::config::{AUTO_INSTALL_PREFIX, AUTO_START_PREFIX, TranslationSettings};
use crate::error::{Result, cause_chain};
use crate::location::{self, ROOT_UNIT_NAME};
use crate::registry::{RegistrySnapshot, Unit};

/// Declared intent to have a unit installed, and maybe started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub location: String,
    pub tier: i32,
    /// Declared under `auto.start`
    pub startable: bool,
}

/// Why a live unit is removed before installing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// No directive declares it
    Undeclared,
    /// Snapshot builds are reinstalled on every pass
    Snapshot,
}

impl EvictionReason {
    fn describe(self) -> &'static str {
        match self {
            Self::Undeclared => "not used",
            Self::Snapshot => "SNAPSHOT",
        }
    }
}

/// Live units to uninstall, and the remaining units indexed by logical name
#[derive(Debug, Clone, Default)]
pub struct EvictionPlan {
    pub evictions: Vec<(Unit, EvictionReason)>,
    pub index: HashMap<String, Unit>,
}

/// Whether `key` declares units, and whether they are to be started.
///
/// The key must be one of the prefixes, optionally followed by `.`-separated
/// segments: `auto.installer` declares nothing.
fn directive_key(key: &str) -> Option<(bool, &str)> {
    [(AUTO_START_PREFIX, true), (AUTO_INSTALL_PREFIX, false)]
        .into_iter()
        .find_map(|(prefix, startable)| {
            let rest = key.strip_prefix(prefix)?;
            (rest.is_empty() || rest.starts_with('.')).then_some((startable, rest))
        })
}

/// Tier from the trailing `.N` of a directive key
fn key_tier(key: &str, rest: &str, default_tier: i32) -> i32 {
    if rest.is_empty() {
        return default_tier;
    }
    let suffix = rest.rsplit('.').next().unwrap_or_default();
    suffix.parse().unwrap_or_else(|_| {
        warn!("Invalid start level: {}", key);
        default_tier
    })
}

/// Collect directives from properties, keyed by logical name.
///
/// Keys are matched case-insensitively. When a logical name is declared more
/// than once, the last declaration wins and keeps the position of the first.
pub fn parse_directives(
    properties: &IndexMap<String, String>,
    default_tier: i32,
) -> IndexMap<String, Directive> {
    let mut directives = IndexMap::new();

    for (key, value) in properties {
        let lowered = key.to_lowercase();
        let Some((startable, rest)) = directive_key(&lowered) else {
            continue;
        };
        let tier = key_tier(key, rest, default_tier);

        for location in location::tokenize_locations(value) {
            let name = location::logical_name(&location);
            if name == ROOT_UNIT_NAME {
                continue;
            }
            directives.insert(
                name,
                Directive {
                    location,
                    tier,
                    startable,
                },
            );
        }
    }

    directives
}

/// Decide which live units to uninstall before installing directives.
///
/// Units named in `kept` count as declared even without a directive; these
/// are the translation add-ons of declared units. The root unit is never
/// evicted nor indexed.
pub fn plan_evictions(
    snapshot: &RegistrySnapshot,
    directives: &IndexMap<String, Directive>,
    kept: &HashSet<String>,
) -> EvictionPlan {
    let mut plan = EvictionPlan::default();

    for unit in &snapshot.units {
        if unit.is_root() {
            continue;
        }
        let name = unit.logical_name();
        if name == ROOT_UNIT_NAME {
            continue;
        }
        if !directives.contains_key(&name) && !kept.contains(&name) {
            plan.evictions.push((unit.clone(), EvictionReason::Undeclared));
        } else if unit.version.is_snapshot() {
            plan.evictions.push((unit.clone(), EvictionReason::Snapshot));
        } else {
            plan.index.insert(name, unit.clone());
        }
    }

    plan
}

impl Deployer<'_> {
    /// Deploy the units declared in `properties`.
    ///
    /// When `translations` is set, every deployed unit gets its translation
    /// add-on kept in step with the catalog.
    pub fn deploy_configuration(
        &mut self,
        properties: &IndexMap<String, String>,
        translations: Option<&TranslationSettings>,
        native_variant: &str,
    ) {
        let directives = parse_directives(properties, self.registry.default_tier());
        let snapshot = match RegistrySnapshot::capture(&*self.registry) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Cannot list installed units: {}", cause_chain(&e));
                return;
            }
        };
        self.progress.set_max(directives.len());

        let kept = translations
            .map(|settings| {
                let declared = snapshot
                    .units
                    .iter()
                    .filter(|unit| directives.contains_key(&unit.logical_name()));
                translation::addon_names(settings, declared)
            })
            .unwrap_or_default();
        let EvictionPlan {
            evictions,
            mut index,
        } = plan_evictions(&snapshot, &directives, &kept);

        for (unit, reason) in evictions {
            let name = unit.logical_name();
            match self.registry.uninstall(&unit) {
                Ok(()) => {
                    info!("Uninstall {}: {}", reason.describe(), name);
                    self.report.uninstalled.push(name);
                }
                // the directive is still installed below
                Err(e) => warn!("Cannot remove {} from the registry: {}", name, cause_chain(&e)),
            }
        }

        for (processed, (name, directive)) in directives.iter().enumerate() {
            self.progress.write_label(&format!("Downloading {name}"));
            if let Err(e) = self.deploy_directive(name, directive, &mut index, translations) {
                if !native_variant.is_empty() && name.contains(native_variant) {
                    warn!("Cannot install native unit: {}", name);
                } else {
                    error!("Cannot install unit {}: {}", name, cause_chain(&e));
                }
                self.report.failed.push(name.clone());
            }
            self.progress.set_value(processed + 1);
        }

        self.progress.write_label("Starting");
        for (name, directive) in directives.iter().filter(|(_, d)| d.startable) {
            if let Err(e) = self.start_directive(name, directive, &index) {
                error!("Cannot start unit {}: {}", name, cause_chain(&e));
                if !self.report.failed.contains(name) {
                    self.report.failed.push(name.clone());
                }
            }
        }
    }

    fn deploy_directive(
        &mut self,
        name: &str,
        directive: &Directive,
        index: &mut HashMap<String, Unit>,
        translations: Option<&TranslationSettings>,
    ) -> Result<()> {
        let unit = match index.get(name) {
            Some(unit) => {
                debug!("{} already installed from {}", name, unit.location);
                unit.clone()
            }
            None => {
                let unit = self
                    .installer
                    .install(&mut *self.registry, &directive.location)?;
                self.report.installed.push(name.to_string());
                index.insert(name.to_string(), unit.clone());
                unit
            }
        };

        self.registry.set_tier(&unit, directive.tier)?;
        if let Some(settings) = translations {
            self.sync_translation(&unit, settings, index);
        }
        Ok(())
    }

    /// Start a declared unit, reinstalling it once when it is missing
    fn start_directive(
        &mut self,
        name: &str,
        directive: &Directive,
        index: &HashMap<String, Unit>,
    ) -> Result<()> {
        let unit = match index.get(name) {
            Some(unit) => unit.clone(),
            None => {
                debug!("{} missing before start, reinstalling", name);
                let unit = self
                    .installer
                    .install(&mut *self.registry, &directive.location)?;
                self.report.installed.push(name.to_string());
                unit
            }
        };
        self.registry.start(&unit)?;
        self.report.started.push(name.to_string());
        Ok(())
    }
}
