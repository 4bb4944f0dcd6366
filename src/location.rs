//! Unit locations
//!
//! Splits configuration values into unit locations and derives the logical
//! name used to match declared units against installed ones.

/// Location (and logical name) of the host's own root unit
pub const ROOT_UNIT_NAME: &str = "System Bundle";

/// Extension of unit archives
pub const ARCHIVE_EXTENSION: &str = ".jar";

/// Suffix appended to archive locations that are served packed
pub const PACKED_SUFFIX: &str = ".pack.gz";

/// Split a configuration value into unit locations.
///
/// Locations are separated by spaces outside of double quotes. Quotes are
/// dropped and every fragment is trimmed. An unterminated quote is not an
/// error: whatever was collected becomes the last location.
pub fn tokenize_locations(value: &str) -> Vec<String> {
    let mut locations = Vec::new();
    let mut current = String::new();
    let mut fragment = String::new();
    let mut started = false;
    let mut in_quote = false;

    for ch in value.chars() {
        match ch {
            '"' => {
                flush_fragment(&mut fragment, &mut current, &mut started);
                in_quote = !in_quote;
            }
            ' ' if !in_quote => {
                flush_fragment(&mut fragment, &mut current, &mut started);
                if started {
                    locations.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            _ => fragment.push(ch),
        }
    }

    flush_fragment(&mut fragment, &mut current, &mut started);
    if started {
        locations.push(current);
    }

    locations
}

fn flush_fragment(fragment: &mut String, current: &mut String, started: &mut bool) {
    if fragment.is_empty() {
        return;
    }
    *started = true;
    current.push_str(fragment.trim());
    fragment.clear();
}

/// Derive the logical name of a unit from its location.
///
/// Takes the last path segment and cuts it at the last archive extension,
/// so `https://host/units/core-1.0.jar.pack.gz` and `file:/opt/core-1.0.jar`
/// both become `core-1.0`.
pub fn logical_name(location: &str) -> String {
    if location == ROOT_UNIT_NAME {
        return location.to_string();
    }
    let file_name = location
        .rfind('/')
        .map_or(location, |index| &location[index + 1..]);
    match file_name.rfind(ARCHIVE_EXTENSION) {
        Some(index) => file_name[..index].to_string(),
        None => file_name.to_string(),
    }
}

/// Whether the location points at a packed archive
pub fn is_packed(location: &str) -> bool {
    location.ends_with(PACKED_SUFFIX)
}

/// Location of the plain archive behind a packed one
pub fn unpacked_location(location: &str) -> &str {
    location.strip_suffix(PACKED_SUFFIX).unwrap_or(location)
}
