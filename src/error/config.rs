//! Configuration errors

use super::DeployError;

/// Creates a config not found error
pub fn not_found(path: impl Into<String>) -> DeployError {
    DeployError::ConfigNotFound { path: path.into() }
}

/// Creates a config parse failed error
pub fn parse_failed(path: impl Into<String>, reason: impl Into<String>) -> DeployError {
    DeployError::ConfigParseFailed {
        path: path.into(),
        reason: reason.into(),
    }
}

/// Creates an invalid config error
pub fn invalid(message: impl Into<String>) -> DeployError {
    DeployError::ConfigInvalid {
        message: message.into(),
    }
}

/// Creates a config read failed error
pub fn read_failed(path: impl Into<String>, reason: impl Into<String>) -> DeployError {
    DeployError::ConfigReadFailed {
        path: path.into(),
        reason: reason.into(),
    }
}
