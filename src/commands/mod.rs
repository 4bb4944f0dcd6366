//! Command implementations for the autodeploy CLI

pub mod completions;
pub mod deploy;
pub mod list;
pub mod version;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Settings;
use crate::error::Result;

/// Settings file looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "autodeploy.yaml";

/// Store directory name under the user data directory
const STORE_DIR_NAME: &str = "autodeploy";

/// Unit store from the CLI argument, or the user data directory
pub fn store_path(store: Option<PathBuf>) -> PathBuf {
    store.unwrap_or_else(|| {
        dirs::data_dir().map_or_else(
            || PathBuf::from(format!(".{STORE_DIR_NAME}")),
            |base| base.join(STORE_DIR_NAME),
        )
    })
}

/// Load the settings file named on the command line.
///
/// Without one, `autodeploy.yaml` in the current directory is used when it
/// exists, and default settings otherwise.
pub fn load_settings(config: Option<PathBuf>) -> Result<Settings> {
    match config {
        Some(path) => Settings::load(&path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                Settings::load(default)
            } else {
                debug!("no {} found, using default settings", DEFAULT_CONFIG_FILE);
                Ok(Settings::default())
            }
        }
    }
}
