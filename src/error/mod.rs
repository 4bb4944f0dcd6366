//! Error types and handling for autodeploy
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`registry`]: Unit registry operation errors
//! - [`fetch`]: Artifact fetching and streaming errors
//! - [`config`]: Configuration file errors

pub mod config;
pub mod fetch;
pub mod registry;

use miette::Diagnostic;
use thiserror::Error;

/// Boxed error used as the cause of registry and fetch failures
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for autodeploy operations
#[derive(Error, Diagnostic, Debug)]
pub enum DeployError {
    // Registry errors
    #[error("Unit {id} is not installed")]
    #[diagnostic(code(autodeploy::registry::unit_not_found))]
    UnitNotFound { id: u64 },

    #[error("Cannot install {location}: {reason}")]
    #[diagnostic(code(autodeploy::registry::install_failed))]
    InstallFailed {
        location: String,
        reason: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("Cannot update {name}: {reason}")]
    #[diagnostic(code(autodeploy::registry::update_failed))]
    UpdateFailed {
        name: String,
        reason: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("Cannot uninstall {name}: {reason}")]
    #[diagnostic(code(autodeploy::registry::uninstall_failed))]
    UninstallFailed {
        name: String,
        reason: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("Cannot start {name}: {reason}")]
    #[diagnostic(code(autodeploy::registry::start_failed))]
    StartFailed {
        name: String,
        reason: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("The root unit cannot be uninstalled")]
    #[diagnostic(code(autodeploy::registry::root_protected))]
    RootUnitProtected,

    #[error("Unit store is corrupt: {path}: {reason}")]
    #[diagnostic(
        code(autodeploy::registry::store_corrupt),
        help("Remove the store directory to start from an empty registry")
    )]
    StoreCorrupt { path: String, reason: String },

    // Fetch errors
    #[error("Unsupported location: {location}")]
    #[diagnostic(
        code(autodeploy::fetch::unsupported_location),
        help("Valid locations: /path/unit.jar, file:/path/unit.jar, https://host/unit.jar")
    )]
    UnsupportedLocation { location: String },

    #[error("Failed to fetch {location}: {reason}")]
    #[diagnostic(code(autodeploy::fetch::failed))]
    FetchFailed {
        location: String,
        reason: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("Packed archive stream failed: {reason}")]
    #[diagnostic(code(autodeploy::fetch::stream_failed))]
    StreamFailed { reason: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(autodeploy::config::not_found))]
    ConfigNotFound { path: String },

    #[error("Failed to read configuration file: {path}")]
    #[diagnostic(code(autodeploy::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}")]
    #[diagnostic(code(autodeploy::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(autodeploy::config::invalid))]
    ConfigInvalid { message: String },

    // File system errors
    #[error("Failed to write file: {path}")]
    #[diagnostic(code(autodeploy::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(autodeploy::fs::io_error))]
    IoError {
        message: String,
        #[source]
        source: Option<Box<std::io::Error>>,
    },
}

impl From<std::io::Error> for DeployError {
    fn from(err: std::io::Error) -> Self {
        DeployError::IoError {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for DeployError {
    fn from(err: serde_yaml::Error) -> Self {
        DeployError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for DeployError {
    fn from(err: serde_json::Error) -> Self {
        DeployError::IoError {
            message: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, DeployError>;

/// Render an error followed by its chain of causes, separated by ` - `
pub fn cause_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        rendered.push_str(" - ");
        rendered.push_str(&inner.to_string());
        cause = inner.source();
    }
    rendered
}
