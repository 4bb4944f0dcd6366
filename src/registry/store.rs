//! File-backed unit registry
//!
//! Layout of a store directory:
//!
//! ```text
//! <store>/
//! ├── registry.yaml     # next id, default tier, installed units
//! └── units/
//!     ├── 1.jar
//!     └── 2.jar
//! ```
//!
//! The index is rewritten after every mutating call, through a temporary
//! file persisted over `registry.yaml`, so an interrupted write never leaves
//! a truncated index behind.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::manifest::UnitMetadata;
use super::{ROOT_UNIT_ID, Unit, UnitRegistry, UnitState, Version};
use crate::error::{self, DeployError, Result};
use crate::location::{self, ARCHIVE_EXTENSION, ROOT_UNIT_NAME};
use crate::source::ArtifactSource;

/// Index file at the store root
pub const INDEX_FILE: &str = "registry.yaml";

/// Directory holding one archive per installed unit
pub const UNITS_DIR: &str = "units";

/// Tier given to units when nothing else is configured
pub const DEFAULT_TIER: i32 = 1;

const ROOT_SYMBOLIC_NAME: &str = "system.bundle";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreIndex {
    next_id: u64,
    #[serde(default = "default_tier")]
    default_tier: i32,
    #[serde(default)]
    units: Vec<Unit>,
}

fn default_tier() -> i32 {
    DEFAULT_TIER
}

impl Default for StoreIndex {
    fn default() -> Self {
        Self {
            next_id: ROOT_UNIT_ID + 1,
            default_tier: DEFAULT_TIER,
            units: vec![root_unit()],
        }
    }
}

fn root_unit() -> Unit {
    Unit {
        id: ROOT_UNIT_ID,
        location: ROOT_UNIT_NAME.to_string(),
        symbolic_name: ROOT_SYMBOLIC_NAME.to_string(),
        version: Version::default(),
        fragment: false,
        tier: 0,
        state: UnitState::Active,
    }
}

/// Registry persisted in a store directory
pub struct FsRegistry {
    root: PathBuf,
    index: StoreIndex,
    source: Arc<dyn ArtifactSource>,
}

impl FsRegistry {
    /// Open the store at `root`, creating it when missing.
    ///
    /// Archives of units installed without a payload are fetched through
    /// `source`.
    pub fn open(root: &Path, source: Arc<dyn ArtifactSource>) -> Result<Self> {
        fs::create_dir_all(root.join(UNITS_DIR))?;
        let index_path = root.join(INDEX_FILE);

        let (index, created) = if index_path.exists() {
            let content = fs::read_to_string(&index_path)?;
            let mut index: StoreIndex = serde_yaml::from_str(&content).map_err(|e| {
                error::registry::store_corrupt(index_path.display().to_string(), e.to_string())
            })?;
            let has_root = index.units.iter().any(Unit::is_root);
            if !has_root {
                index.units.insert(0, root_unit());
            }
            (index, !has_root)
        } else {
            (StoreIndex::default(), true)
        };

        let registry = Self {
            root: root.to_path_buf(),
            index,
            source,
        };
        if created {
            debug!("initialized unit store at {}", root.display());
            registry.save()?;
        }
        Ok(registry)
    }

    /// Path of the stored archive of unit `id`
    pub fn artifact_path(&self, id: u64) -> PathBuf {
        self.root
            .join(UNITS_DIR)
            .join(format!("{id}{ARCHIVE_EXTENSION}"))
    }

    fn save(&self) -> Result<()> {
        let index_path = self.root.join(INDEX_FILE);
        let write_failed = |reason: String| DeployError::FileWriteFailed {
            path: index_path.display().to_string(),
            reason,
        };

        let content =
            serde_yaml::to_string(&self.index).map_err(|e| write_failed(e.to_string()))?;
        let mut temp = NamedTempFile::new_in(&self.root).map_err(|e| write_failed(e.to_string()))?;
        temp.write_all(content.as_bytes())
            .map_err(|e| write_failed(e.to_string()))?;
        temp.persist(&index_path)
            .map_err(|e| write_failed(e.error.to_string()))?;
        Ok(())
    }

    /// Stream `reader` into the archive slot of unit `id`
    fn store_artifact(&self, id: u64, reader: &mut dyn Read) -> io::Result<PathBuf> {
        let path = self.artifact_path(id);
        let mut temp = NamedTempFile::new_in(self.root.join(UNITS_DIR))?;
        io::copy(reader, &mut temp)?;
        temp.flush()?;
        temp.persist(&path).map_err(|e| e.error)?;
        Ok(path)
    }

    fn position(&self, id: u64) -> Result<usize> {
        self.index
            .units
            .iter()
            .position(|unit| unit.id == id)
            .ok_or(DeployError::UnitNotFound { id })
    }
}

impl UnitRegistry for FsRegistry {
    fn installed_units(&self) -> Result<Vec<Unit>> {
        Ok(self.index.units.clone())
    }

    fn unit_by_location(&self, location: &str) -> Option<Unit> {
        self.index
            .units
            .iter()
            .find(|unit| unit.location == location)
            .cloned()
    }

    fn install(&mut self, location: &str, payload: Option<&mut dyn Read>) -> Result<Unit> {
        if let Some(existing) = self.unit_by_location(location) {
            debug!("{} already installed as unit {}", location, existing.id);
            return Ok(existing);
        }

        let id = self.index.next_id;
        let stored = match payload {
            Some(reader) => self.store_artifact(id, reader),
            None => {
                let mut reader = self
                    .source
                    .open(location)
                    .map_err(|e| error::registry::install_failed(location, "cannot fetch archive", e))?;
                self.store_artifact(id, &mut reader)
            }
        }
        .map_err(|e| error::registry::install_failed(location, "cannot store archive", e))?;

        let metadata = UnitMetadata::resolve(&stored, &location::logical_name(location));
        let unit = Unit {
            id,
            location: location.to_string(),
            symbolic_name: metadata.symbolic_name,
            version: metadata.version,
            fragment: metadata.fragment,
            tier: self.index.default_tier,
            state: UnitState::Installed,
        };
        self.index.next_id += 1;
        self.index.units.push(unit.clone());
        self.save()?;

        info!("installed {} {} as unit {}", unit.symbolic_name, unit.version, id);
        Ok(unit)
    }

    fn update(&mut self, unit: &Unit) -> Result<Unit> {
        let index = self.position(unit.id)?;
        if unit.is_root() {
            return Ok(self.index.units[index].clone());
        }

        let name = unit.logical_name();
        let mut reader = self
            .source
            .open(&unit.location)
            .map_err(|e| error::registry::update_failed(&name, "cannot fetch archive", e))?;
        let stored = self
            .store_artifact(unit.id, &mut reader)
            .map_err(|e| error::registry::update_failed(&name, "cannot store archive", e))?;

        let metadata = UnitMetadata::resolve(&stored, &name);
        let updated = &mut self.index.units[index];
        updated.symbolic_name = metadata.symbolic_name;
        updated.version = metadata.version;
        updated.fragment = metadata.fragment;
        let updated = updated.clone();
        self.save()?;

        info!("updated {} to {}", updated.symbolic_name, updated.version);
        Ok(updated)
    }

    fn uninstall(&mut self, unit: &Unit) -> Result<()> {
        if unit.is_root() {
            return Err(DeployError::RootUnitProtected);
        }
        let index = self.position(unit.id)?;

        let removed = self.index.units.remove(index);
        if let Err(e) = self.save() {
            self.index.units.insert(index, removed);
            return Err(error::registry::uninstall_failed(
                unit.logical_name(),
                e.to_string(),
            ));
        }
        match fs::remove_file(self.artifact_path(unit.id)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            // the unit is gone from the index, only its archive is left over
            Err(e) => warn!("cannot remove archive of unit {}: {}", unit.id, e),
        }

        info!("uninstalled {} (unit {})", removed.symbolic_name, removed.id);
        Ok(())
    }

    fn start(&mut self, unit: &Unit) -> Result<()> {
        let index = self.position(unit.id)?;
        let stored = &mut self.index.units[index];
        if stored.fragment {
            return Err(error::registry::start_failed(
                unit.logical_name(),
                "fragments cannot be started",
            ));
        }
        stored.state = UnitState::Active;
        self.save()
    }

    fn default_tier(&self) -> i32 {
        self.index.default_tier
    }

    fn set_tier(&mut self, unit: &Unit, tier: i32) -> Result<()> {
        let index = self.position(unit.id)?;
        self.index.units[index].tier = tier;
        self.save()
    }
}
