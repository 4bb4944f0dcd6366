//! Test fixtures for exercising planners without a real module host.
//!
//! - [`FakeRegistry`]: in-memory [`UnitRegistry`] that records every call
//! - [`RecordingProgress`]: progress sink that remembers what it was told
//! - [`MemorySource`]: artifact source serving byte buffers by location
//! - [`gzip`]: packs bytes the way packed archives are served
//! - [`zip_archive`]: builds an uncompressed zip archive in memory
//! - [`capture_logs`]: runs a closure with its log output captured
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_fixtures::{Call, FakeRegistry};
//!
//! #[test]
//! fn my_test() {
//!     let mut registry = FakeRegistry::new().with_unit("file:/opt/u-1.jar", "1.0.0");
//!     // ... run a planner against &mut registry ...
//!     assert!(registry.calls.contains(&Call::Start("u-1".to_string())));
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};

use flate2::{Compression, Crc};
use flate2::write::GzEncoder;

use crate::error::{self, DeployError, Result};
use crate::location::{self, ROOT_UNIT_NAME};
use crate::progress::ProgressSink;
use crate::registry::manifest;
use crate::registry::{ROOT_UNIT_ID, Unit, UnitRegistry, UnitState, Version};
use crate::source::ArtifactSource;

/// A registry call, named by logical name except for installs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Install {
        location: String,
        payload: Option<Vec<u8>>,
    },
    Update(String),
    Uninstall(String),
    Start(String),
    SetTier(String, i32),
}

/// In-memory registry recording every call made against it
#[derive(Debug)]
pub struct FakeRegistry {
    pub units: Vec<Unit>,
    pub calls: Vec<Call>,
    pub default_tier: i32,
    next_id: u64,
    fragments: HashSet<String>,
    failing_installs: HashSet<String>,
    failing_uninstalls: HashSet<String>,
    failing_starts: HashSet<String>,
}

impl FakeRegistry {
    /// A registry holding only the root unit
    pub fn new() -> Self {
        let root = Unit {
            id: ROOT_UNIT_ID,
            location: ROOT_UNIT_NAME.to_string(),
            symbolic_name: "system.bundle".to_string(),
            version: Version::default(),
            fragment: false,
            tier: 0,
            state: UnitState::Active,
        };
        Self {
            units: vec![root],
            calls: Vec::new(),
            default_tier: 1,
            next_id: 1,
            fragments: HashSet::new(),
            failing_installs: HashSet::new(),
            failing_uninstalls: HashSet::new(),
            failing_starts: HashSet::new(),
        }
    }

    /// Add an already installed unit (not recorded as a call)
    #[must_use]
    pub fn with_unit(mut self, location: &str, version: &str) -> Self {
        let mut unit = self.new_unit(location);
        unit.version = Version::parse(version);
        self.units.push(unit);
        self
    }

    /// Units with this logical name are fragments when installed
    #[must_use]
    pub fn with_fragment(mut self, name: &str) -> Self {
        self.fragments.insert(name.to_string());
        self
    }

    #[must_use]
    pub fn failing_install(mut self, name: &str) -> Self {
        self.failing_installs.insert(name.to_string());
        self
    }

    #[must_use]
    pub fn failing_uninstall(mut self, name: &str) -> Self {
        self.failing_uninstalls.insert(name.to_string());
        self
    }

    #[must_use]
    pub fn failing_start(mut self, name: &str) -> Self {
        self.failing_starts.insert(name.to_string());
        self
    }

    /// Logical names of installed units, root excluded
    pub fn names(&self) -> Vec<String> {
        self.units
            .iter()
            .filter(|unit| !unit.is_root())
            .map(Unit::logical_name)
            .collect()
    }

    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.logical_name() == name)
    }

    /// Logical names of started units, in call order
    pub fn started(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Start(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Install locations, in call order
    pub fn installed_locations(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Install { location, .. } => Some(location.clone()),
                _ => None,
            })
            .collect()
    }

    /// Whether any call touched the unit with this logical name
    pub fn touched(&self, name: &str) -> bool {
        self.calls.iter().any(|call| match call {
            Call::Install { location, .. } => location::logical_name(location) == name,
            Call::Update(n) | Call::Uninstall(n) | Call::Start(n) | Call::SetTier(n, _) => {
                n == name
            }
        })
    }

    fn new_unit(&mut self, location: &str) -> Unit {
        let name = location::logical_name(location);
        let metadata = manifest::from_file_name(&name);
        let unit = Unit {
            id: self.next_id,
            location: location.to_string(),
            symbolic_name: metadata.symbolic_name,
            version: metadata.version,
            fragment: self.fragments.contains(&name),
            tier: self.default_tier,
            state: UnitState::Installed,
        };
        self.next_id += 1;
        unit
    }

    fn position(&self, unit: &Unit) -> Result<usize> {
        self.units
            .iter()
            .position(|u| u.id == unit.id)
            .ok_or(DeployError::UnitNotFound { id: unit.id })
    }
}

impl Default for FakeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry for FakeRegistry {
    fn installed_units(&self) -> Result<Vec<Unit>> {
        Ok(self.units.clone())
    }

    fn unit_by_location(&self, location: &str) -> Option<Unit> {
        self.units.iter().find(|u| u.location == location).cloned()
    }

    fn install(&mut self, location: &str, payload: Option<&mut dyn Read>) -> Result<Unit> {
        let payload = match payload {
            Some(reader) => {
                let mut bytes = Vec::new();
                reader
                    .read_to_end(&mut bytes)
                    .map_err(|e| error::registry::install_failed(location, "cannot read archive", e))?;
                Some(bytes)
            }
            None => None,
        };
        self.calls.push(Call::Install {
            location: location.to_string(),
            payload,
        });

        let name = location::logical_name(location);
        if self.failing_installs.contains(&name) {
            return Err(DeployError::InstallFailed {
                location: location.to_string(),
                reason: "simulated failure".to_string(),
                source: None,
            });
        }
        if let Some(existing) = self.unit_by_location(location) {
            return Ok(existing);
        }
        let unit = self.new_unit(location);
        self.units.push(unit.clone());
        Ok(unit)
    }

    fn update(&mut self, unit: &Unit) -> Result<Unit> {
        self.calls.push(Call::Update(unit.logical_name()));
        let index = self.position(unit)?;
        Ok(self.units[index].clone())
    }

    fn uninstall(&mut self, unit: &Unit) -> Result<()> {
        let name = unit.logical_name();
        self.calls.push(Call::Uninstall(name.clone()));
        if unit.is_root() {
            return Err(DeployError::RootUnitProtected);
        }
        if self.failing_uninstalls.contains(&name) {
            return Err(error::registry::uninstall_failed(name, "simulated failure"));
        }
        let index = self.position(unit)?;
        self.units.remove(index);
        Ok(())
    }

    fn start(&mut self, unit: &Unit) -> Result<()> {
        let name = unit.logical_name();
        self.calls.push(Call::Start(name.clone()));
        if self.failing_starts.contains(&name) {
            return Err(error::registry::start_failed(name, "simulated failure"));
        }
        let index = self.position(unit)?;
        self.units[index].state = UnitState::Active;
        Ok(())
    }

    fn default_tier(&self) -> i32 {
        self.default_tier
    }

    fn set_tier(&mut self, unit: &Unit, tier: i32) -> Result<()> {
        self.calls.push(Call::SetTier(unit.logical_name(), tier));
        let index = self.position(unit)?;
        self.units[index].tier = tier;
        Ok(())
    }
}

/// Progress sink remembering every update
#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub max: Vec<usize>,
    pub values: Vec<usize>,
    pub labels: Vec<String>,
}

impl RecordingProgress {
    pub fn last_value(&self) -> Option<usize> {
        self.values.last().copied()
    }
}

impl ProgressSink for RecordingProgress {
    fn set_max(&mut self, max: usize) {
        self.max.push(max);
    }

    fn set_value(&mut self, value: usize) {
        self.values.push(value);
    }

    fn write_label(&mut self, label: &str) {
        self.labels.push(label.to_string());
    }
}

/// Artifact source serving in-memory archives
#[derive(Debug, Default)]
pub struct MemorySource {
    entries: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, location: &str, bytes: Vec<u8>) -> Self {
        self.entries.insert(location.to_string(), bytes);
        self
    }
}

impl ArtifactSource for MemorySource {
    fn open(&self, location: &str) -> Result<Box<dyn Read + Send>> {
        match self.entries.get(location) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(error::fetch::fetch_failed(
                location,
                "not found",
                io::Error::new(io::ErrorKind::NotFound, location.to_string()),
            )),
        }
    }
}

/// Gzip `bytes`
///
/// # Panics
///
/// Panics if compression into memory fails.
#[allow(clippy::expect_used)]
pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("Failed to compress");
    encoder.finish().expect("Failed to finish gzip stream")
}

/// Build a zip archive with stored (uncompressed) entries
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    const DOS_DATE: u16 = 0x21; // 1980-01-01

    let mut archive = Vec::new();
    let mut central = Vec::new();

    for (name, data) in entries {
        let mut crc = Crc::new();
        crc.update(data);
        let offset = archive.len() as u32;
        let size = data.len() as u32;
        let name_len = name.len() as u16;

        archive.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        for field in [20u16, 0, 0, 0, DOS_DATE] {
            archive.extend_from_slice(&field.to_le_bytes());
        }
        for field in [crc.sum(), size, size] {
            archive.extend_from_slice(&field.to_le_bytes());
        }
        archive.extend_from_slice(&name_len.to_le_bytes());
        archive.extend_from_slice(&0u16.to_le_bytes());
        archive.extend_from_slice(name.as_bytes());
        archive.extend_from_slice(data);

        central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        for field in [20u16, 20, 0, 0, 0, DOS_DATE] {
            central.extend_from_slice(&field.to_le_bytes());
        }
        for field in [crc.sum(), size, size] {
            central.extend_from_slice(&field.to_le_bytes());
        }
        for field in [name_len, 0, 0, 0, 0] {
            central.extend_from_slice(&field.to_le_bytes());
        }
        central.extend_from_slice(&0u32.to_le_bytes());
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
    }

    let central_offset = archive.len() as u32;
    let central_size = central.len() as u32;
    let count = entries.len() as u16;
    archive.extend_from_slice(&central);
    archive.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    for field in [0u16, 0, count, count] {
        archive.extend_from_slice(&field.to_le_bytes());
    }
    archive.extend_from_slice(&central_size.to_le_bytes());
    archive.extend_from_slice(&central_offset.to_le_bytes());
    archive.extend_from_slice(&0u16.to_le_bytes());
    archive
}

/// Shared buffer the capturing subscriber writes into
#[derive(Debug, Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` on this thread with every log line at `debug` and above captured
/// as plain text (`LEVEL message`)
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let value = tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().map(|b| b.clone()).unwrap_or_default();
    (value, String::from_utf8_lossy(&bytes).into_owned())
}
