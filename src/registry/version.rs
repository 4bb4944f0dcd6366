//! Unit versions: `major.minor.micro[.qualifier]`

use std::fmt;

use serde::{Deserialize, Serialize};

/// Qualifier suffix of builds that must be reinstalled on every pass
pub const SNAPSHOT_MARKER: &str = "SNAPSHOT";

/// Version of an installed unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
    pub qualifier: String,
}

impl Version {
    /// Parse a version leniently.
    ///
    /// Missing numeric components are zero. The first component that is not
    /// a number starts the qualifier, which takes the rest of the input.
    pub fn parse(input: &str) -> Self {
        let mut numbers = [0u32; 3];
        let mut rest = input.trim();

        for slot in &mut numbers {
            if rest.is_empty() {
                break;
            }
            let (head, tail) = rest.split_once('.').unwrap_or((rest, ""));
            match head.parse::<u32>() {
                Ok(number) => {
                    *slot = number;
                    rest = tail;
                }
                Err(_) => break,
            }
        }

        let [major, minor, micro] = numbers;
        Version {
            major,
            minor,
            micro,
            qualifier: rest.to_string(),
        }
    }

    /// Whether this is a snapshot build
    pub fn is_snapshot(&self) -> bool {
        self.qualifier.ends_with(SNAPSHOT_MARKER)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

impl From<String> for Version {
    fn from(value: String) -> Self {
        Version::parse(&value)
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}
