//! Unit metadata
//!
//! Metadata comes from `META-INF/MANIFEST.MF` inside the unit archive. When
//! the archive has no readable manifest it is derived from the file name
//! (`core-api-2.0.0-SNAPSHOT` is symbolic name `core-api`, version
//! `2.0.0.SNAPSHOT`).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use super::version::Version;

/// Path of the manifest inside a unit archive
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

const SYMBOLIC_NAME_HEADER: &str = "Bundle-SymbolicName";
const VERSION_HEADER: &str = "Bundle-Version";
const FRAGMENT_HOST_HEADER: &str = "Fragment-Host";

/// Identity and kind of a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMetadata {
    pub symbolic_name: String,
    pub version: Version,
    pub fragment: bool,
}

impl UnitMetadata {
    /// Read metadata from a stored archive, falling back to the logical name
    pub fn resolve(archive: &Path, logical_name: &str) -> Self {
        match read_archive_manifest(archive) {
            Some(text) => parse_manifest(&text).unwrap_or_else(|| from_file_name(logical_name)),
            None => from_file_name(logical_name),
        }
    }
}

/// Parse manifest headers into unit metadata.
///
/// Returns `None` when the manifest does not name the unit.
pub fn parse_manifest(text: &str) -> Option<UnitMetadata> {
    let mut symbolic_name = None;
    let mut version = Version::default();
    let mut fragment = false;

    for (name, value) in manifest_headers(text) {
        match name.as_str() {
            SYMBOLIC_NAME_HEADER => {
                let bare = value.split(';').next().unwrap_or_default().trim();
                if !bare.is_empty() {
                    symbolic_name = Some(bare.to_string());
                }
            }
            VERSION_HEADER => version = Version::parse(&value),
            FRAGMENT_HOST_HEADER => fragment = !value.trim().is_empty(),
            _ => {}
        }
    }

    symbolic_name.map(|symbolic_name| UnitMetadata {
        symbolic_name,
        version,
        fragment,
    })
}

/// Header name/value pairs of the main manifest section, continuation
/// lines (starting with a single space) joined to their header
fn manifest_headers(text: &str) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = Vec::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            // end of the main section
            break;
        }
        if let Some(continuation) = line.strip_prefix(' ') {
            if let Some((_, value)) = headers.last_mut() {
                value.push_str(continuation);
            }
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim_start().to_string()));
        }
    }
    headers
}

/// Derive metadata from a logical name such as `core-api-2.0.0-SNAPSHOT`
pub fn from_file_name(logical_name: &str) -> UnitMetadata {
    let split = logical_name
        .char_indices()
        .find(|&(index, ch)| {
            ch == '-'
                && logical_name[index + 1..]
                    .chars()
                    .next()
                    .is_some_and(|next| next.is_ascii_digit())
        })
        .map(|(index, _)| index);

    let (symbolic_name, version) = match split {
        Some(index) => (
            &logical_name[..index],
            Version::parse(&logical_name[index + 1..].replace('-', ".")),
        ),
        None => (logical_name, Version::default()),
    };

    UnitMetadata {
        symbolic_name: symbolic_name.to_string(),
        version,
        fragment: false,
    }
}

fn read_archive_manifest(archive: &Path) -> Option<String> {
    let file = match File::open(archive) {
        Ok(file) => file,
        Err(e) => {
            debug!("cannot open {}: {}", archive.display(), e);
            return None;
        }
    };
    let mut buffer = vec![0u8; rawzip::RECOMMENDED_BUFFER_SIZE];
    let zip = match rawzip::ZipArchive::from_file(file, &mut buffer) {
        Ok(zip) => zip,
        Err(e) => {
            debug!("not a zip archive, using file name metadata: {:?}", e);
            return None;
        }
    };

    let mut entries = zip.entries(&mut buffer);
    while let Some(entry) = entries.next_entry().ok()? {
        let Ok(path) = entry.file_path().try_normalize() else {
            continue;
        };
        let path: &str = path.as_ref();
        if path != MANIFEST_PATH {
            continue;
        }

        let method = entry.compression_method();
        let zip_entry = zip.get_entry(entry.wayfinder()).ok()?;
        let mut reader = zip_entry.reader();
        let mut text = String::new();
        match method {
            rawzip::CompressionMethod::Store => {
                reader.read_to_string(&mut text).ok()?;
            }
            rawzip::CompressionMethod::Deflate => {
                flate2::read::DeflateDecoder::new(reader)
                    .read_to_string(&mut text)
                    .ok()?;
            }
            method => {
                debug!("unsupported manifest compression: {:?}", method);
                return None;
            }
        }
        return Some(text);
    }

    None
}
