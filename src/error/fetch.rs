//! Artifact fetching errors

use super::{BoxedCause, DeployError};

/// Creates an unsupported location error
pub fn unsupported_location(location: impl Into<String>) -> DeployError {
    DeployError::UnsupportedLocation {
        location: location.into(),
    }
}

/// Creates a fetch failed error with a cause
pub fn fetch_failed(
    location: impl Into<String>,
    reason: impl Into<String>,
    source: impl Into<BoxedCause>,
) -> DeployError {
    DeployError::FetchFailed {
        location: location.into(),
        reason: reason.into(),
        source: Some(source.into()),
    }
}

/// Creates a packed stream failure
pub fn stream_failed(reason: impl Into<String>) -> DeployError {
    DeployError::StreamFailed {
        reason: reason.into(),
    }
}
