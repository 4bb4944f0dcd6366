//! Settings file handling for autodeploy
//!
//! The settings file is YAML:
//!
//! ```yaml
//! properties:
//!   auto.deploy.action: install,start
//!   auto.start.2: "file:/opt/units/core-1.0.jar"
//! translations:
//!   base: https://host/i18n
//!   catalog:
//!     core-i18n-2.0.0.jar: "20240101"
//! proxy_auth: user:secret
//! native_variant: linux-x86-64
//! directory_only: false
//! ```
//!
//! `properties` is the flat configuration map the planners read. The other
//! fields configure collaborators of the reconciler.

pub mod actions;
pub mod serialization;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{self, DeployError, Result};

pub use actions::{Action, ActionSet};

/// Directory scanned for unit archives
pub const DEPLOY_DIR_KEY: &str = "auto.deploy.dir";

/// Default for [`DEPLOY_DIR_KEY`]
pub const DEPLOY_DIR_DEFAULT: &str = "bundle";

/// Comma-separated directory actions
pub const DEPLOY_ACTION_KEY: &str = "auto.deploy.action";

/// Activation tier of units found in the deploy directory
pub const DEPLOY_TIER_KEY: &str = "auto.deploy.startlevel";

/// Prefix of keys listing units to install
pub const AUTO_INSTALL_PREFIX: &str = "auto.install";

/// Prefix of keys listing units to install and start
pub const AUTO_START_PREFIX: &str = "auto.start";

/// Where translation add-ons are hosted and which versions to expect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationSettings {
    /// Base location the add-on archives are installed from
    pub base: String,
    /// Add-on file name to expected version qualifier
    #[serde(default)]
    pub catalog: BTreeMap<String, String>,
}

/// Contents of the settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "serialization::deserialize_properties")]
    pub properties: IndexMap<String, String>,
    pub translations: Option<TranslationSettings>,
    /// `user:password` for proxies in front of web locations
    pub proxy_auth: Option<String>,
    /// Marker in unit names of platform specific native variants
    pub native_variant: Option<String>,
    /// Skip the configuration step, so undeclared units survive a pass
    pub directory_only: bool,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(error::config::not_found(path.display().to_string()));
        }
        let content = fs::read_to_string(path)
            .map_err(|e| error::config::read_failed(path.display().to_string(), e.to_string()))?;
        Self::from_yaml(&content).map_err(|e| match e {
            DeployError::ConfigParseFailed { reason, .. } => {
                error::config::parse_failed(path.display().to_string(), reason)
            }
            other => other,
        })
    }

    /// Parse settings from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if let Some(ref translations) = self.translations {
            if translations.base.trim().is_empty() {
                return Err(error::config::invalid(
                    "translations.base must name the location translation add-ons are served from",
                ));
            }
        }
        Ok(())
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Directory scanned for unit archives
    pub fn deploy_dir(&self) -> PathBuf {
        PathBuf::from(self.property(DEPLOY_DIR_KEY).unwrap_or(DEPLOY_DIR_DEFAULT))
    }

    /// Enabled directory actions, empty when not configured
    pub fn deploy_actions(&self) -> ActionSet {
        ActionSet::parse(self.property(DEPLOY_ACTION_KEY).unwrap_or_default())
    }

    /// Configured tier for directory units, `None` when absent or not a number
    pub fn deploy_tier(&self) -> Option<i32> {
        self.property(DEPLOY_TIER_KEY)
            .and_then(|value| value.trim().parse().ok())
    }

    /// Native variant marker, defaulting to `<os>-<arch>` of this build
    pub fn native_variant(&self) -> String {
        self.native_variant.clone().unwrap_or_else(|| {
            format!(
                "{}-{}",
                std::env::consts::OS,
                std::env::consts::ARCH.replace('_', "-")
            )
        })
    }
}
