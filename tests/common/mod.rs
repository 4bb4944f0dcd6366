//! Common test utilities for autodeploy integration tests

use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

/// A scratch directory holding a settings file, unit archives and a store
#[allow(dead_code)]
pub struct TestWorkspace {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp
            .path()
            .canonicalize()
            .expect("Failed to resolve temp directory");
        Self { temp, path }
    }

    /// Store directory used by [`TestWorkspace::cmd`]
    pub fn store(&self) -> PathBuf {
        self.path.join("store")
    }

    /// Write a file relative to the workspace root, creating parent directories
    pub fn write_file(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.path.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Write a unit archive whose bytes are its own file name
    pub fn write_unit(&self, relative: &str) -> PathBuf {
        let name = Path::new(relative)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.write_file(relative, name.as_bytes())
    }

    /// Write a gzip-packed unit archive
    #[allow(dead_code)]
    pub fn write_packed_unit(&self, relative: &str, archive: &[u8]) -> PathBuf {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(archive).expect("Failed to compress");
        let packed = encoder.finish().expect("Failed to finish gzip stream");
        self.write_file(relative, &packed)
    }

    /// Write `autodeploy.yaml` at the workspace root
    pub fn write_settings(&self, yaml: &str) {
        self.write_file("autodeploy.yaml", yaml.as_bytes());
    }

    /// Command running in the workspace against its store
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("autodeploy").expect("Failed to find binary");
        // Ignore any developer overrides
        for var in [
            "AUTODEPLOY_CONFIG",
            "AUTODEPLOY_PROXY_AUTH",
            "AUTODEPLOY_LOG",
        ] {
            cmd.env_remove(var);
        }
        cmd.env("AUTODEPLOY_STORE", self.store());
        cmd.current_dir(&self.path);
        cmd
    }

    /// Units of the store as JSON, from `autodeploy list --json`
    pub fn units(&self) -> Vec<serde_json::Value> {
        let output = self
            .cmd()
            .args(["list", "--json"])
            .output()
            .expect("Failed to run list");
        assert!(output.status.success(), "list failed: {output:?}");
        serde_json::from_slice(&output.stdout).expect("list --json is not JSON")
    }

    /// Symbolic names of non-root units, in id order
    pub fn unit_names(&self) -> Vec<String> {
        self.units()
            .iter()
            .filter(|unit| unit["id"] != 0)
            .filter_map(|unit| unit["symbolic_name"].as_str().map(str::to_string))
            .collect()
    }
}
