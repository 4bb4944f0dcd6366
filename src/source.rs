//! Artifact sources
//!
//! Opens the byte stream behind a unit location. Supported locations:
//! - Plain file system paths (`/opt/units/core.jar`)
//! - `file:` URLs
//! - `http://` and `https://` URLs, optionally through an authenticating proxy

use std::fs::File;
use std::io::Read;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;
use url::Url;

use crate::error::{Result, fetch};

/// Opens unit archives by location
pub trait ArtifactSource: Send + Sync {
    fn open(&self, location: &str) -> Result<Box<dyn Read + Send>>;
}

/// Source for local paths, `file:` URLs and web URLs
#[derive(Debug, Clone, Default)]
pub struct UrlSource {
    /// `user:password` sent to the proxy for web locations
    proxy_auth: Option<String>,
}

impl UrlSource {
    pub fn new(proxy_auth: Option<String>) -> Self {
        Self {
            proxy_auth: proxy_auth.filter(|auth| !auth.is_empty()),
        }
    }

    fn open_web(&self, location: &str) -> Result<Box<dyn Read + Send>> {
        let mut request = ureq::get(location);
        if let Some(ref auth) = self.proxy_auth {
            request = request.set("Proxy-Authorization", &proxy_authorization(auth));
        }
        debug!("fetching {}", location);
        let response = request
            .call()
            .map_err(|e| fetch::fetch_failed(location, "request failed", e))?;
        Ok(response.into_reader())
    }

    fn open_file(location: &str, path: &std::path::Path) -> Result<Box<dyn Read + Send>> {
        let file = File::open(path).map_err(|e| fetch::fetch_failed(location, e.to_string(), e))?;
        Ok(Box::new(file))
    }
}

impl ArtifactSource for UrlSource {
    fn open(&self, location: &str) -> Result<Box<dyn Read + Send>> {
        if is_web_location(location) {
            return self.open_web(location);
        }
        if location.starts_with("file:") {
            let path = Url::parse(location)
                .ok()
                .and_then(|url| url.to_file_path().ok())
                .ok_or_else(|| fetch::unsupported_location(location))?;
            return Self::open_file(location, &path);
        }
        if location.contains("://") {
            return Err(fetch::unsupported_location(location));
        }
        Self::open_file(location, std::path::Path::new(location))
    }
}

/// Whether the location is fetched over HTTP
pub fn is_web_location(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Value of the `Proxy-Authorization` header for a `user:password` credential
pub fn proxy_authorization(auth: &str) -> String {
    format!("Basic {}", STANDARD.encode(auth.as_bytes()))
}

/// `file:` URL of a local archive
pub fn file_location(path: &std::path::Path) -> String {
    Url::from_file_path(path).map_or_else(|()| path.display().to_string(), String::from)
}
