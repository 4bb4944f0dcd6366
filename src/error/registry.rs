//! Unit registry errors

use super::{BoxedCause, DeployError};

/// Creates an install failed error with a cause
pub fn install_failed(
    location: impl Into<String>,
    reason: impl Into<String>,
    source: impl Into<BoxedCause>,
) -> DeployError {
    DeployError::InstallFailed {
        location: location.into(),
        reason: reason.into(),
        source: Some(source.into()),
    }
}

/// Creates an update failed error with a cause
pub fn update_failed(
    name: impl Into<String>,
    reason: impl Into<String>,
    source: impl Into<BoxedCause>,
) -> DeployError {
    DeployError::UpdateFailed {
        name: name.into(),
        reason: reason.into(),
        source: Some(source.into()),
    }
}

/// Creates an uninstall failed error
pub fn uninstall_failed(name: impl Into<String>, reason: impl Into<String>) -> DeployError {
    DeployError::UninstallFailed {
        name: name.into(),
        reason: reason.into(),
        source: None,
    }
}

/// Creates a start failed error
pub fn start_failed(name: impl Into<String>, reason: impl Into<String>) -> DeployError {
    DeployError::StartFailed {
        name: name.into(),
        reason: reason.into(),
        source: None,
    }
}

/// Creates a store corrupt error
pub fn store_corrupt(path: impl Into<String>, reason: impl Into<String>) -> DeployError {
    DeployError::StoreCorrupt {
        path: path.into(),
        reason: reason.into(),
    }
}
