//! Unit registry
//!
//! The registry is the live set of installed units the reconciler converges.
//! Planners only talk to it through [`UnitRegistry`], and read it once per
//! pass through a [`RegistrySnapshot`].
//!
//! - [`store`]: file-backed registry used by the CLI
//! - [`manifest`]: unit metadata read from archives
//! - [`version`]: unit versions and snapshot detection

pub mod manifest;
pub mod store;
pub mod version;

use std::collections::HashMap;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::location;

pub use store::FsRegistry;
pub use version::Version;

/// Registry id of the host's own root unit
pub const ROOT_UNIT_ID: u64 = 0;

/// Lifecycle state of an installed unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    Installed,
    Active,
}

/// An installed unit as reported by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Registry-assigned id, `0` for the root unit
    pub id: u64,
    /// Location the unit was installed from
    pub location: String,
    /// Symbolic name from the unit's manifest
    pub symbolic_name: String,
    pub version: Version,
    /// Fragments attach to a host unit and are never started
    #[serde(default)]
    pub fragment: bool,
    /// Activation tier
    pub tier: i32,
    pub state: UnitState,
}

impl Unit {
    /// Logical name used to match this unit against declared ones
    pub fn logical_name(&self) -> String {
        location::logical_name(&self.location)
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_UNIT_ID
    }
}

/// Operations the reconciler needs from a module host.
///
/// Every call is expected to be atomic with respect to the registry's own
/// state. Implementations report failures as [`crate::error::DeployError`].
pub trait UnitRegistry {
    /// All currently installed units, root included
    fn installed_units(&self) -> Result<Vec<Unit>>;

    /// The unit installed from exactly this location, if any
    fn unit_by_location(&self, location: &str) -> Option<Unit>;

    /// Install a unit.
    ///
    /// When `payload` is given the archive bytes are read from it, otherwise
    /// they are fetched from `location`. Installing a location that is
    /// already installed returns the existing unit.
    fn install(&mut self, location: &str, payload: Option<&mut dyn Read>) -> Result<Unit>;

    /// Refetch a unit from its location
    fn update(&mut self, unit: &Unit) -> Result<Unit>;

    fn uninstall(&mut self, unit: &Unit) -> Result<()>;

    fn start(&mut self, unit: &Unit) -> Result<()>;

    /// Tier assigned to units when nothing else is configured
    fn default_tier(&self) -> i32;

    fn set_tier(&mut self, unit: &Unit, tier: i32) -> Result<()>;
}

/// The registry's installed units, read once at the start of a pass
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub units: Vec<Unit>,
}

impl RegistrySnapshot {
    pub fn capture(registry: &dyn UnitRegistry) -> Result<Self> {
        Ok(Self {
            units: registry.installed_units()?,
        })
    }

    /// Index the snapshot by unit location
    pub fn by_location(&self) -> HashMap<String, Unit> {
        self.units
            .iter()
            .map(|unit| (unit.location.clone(), unit.clone()))
            .collect()
    }
}
