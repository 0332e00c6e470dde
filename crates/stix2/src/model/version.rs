//! STIX specification versions.

use std::fmt;
use std::str::FromStr;

use crate::error::StixError;

/// A STIX schema generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SpecVersion {
    V20,
    #[default]
    V21,
}

impl SpecVersion {
    /// Returns the wire spelling (`"2.0"` or `"2.1"`).
    pub fn as_str(self) -> &'static str {
        match self {
            SpecVersion::V20 => "2.0",
            SpecVersion::V21 => "2.1",
        }
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecVersion {
    type Err = StixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2.0" => Ok(SpecVersion::V20),
            "2.1" => Ok(SpecVersion::V21),
            other => Err(StixError::Parse(format!(
                "unsupported STIX version '{}'",
                other
            ))),
        }
    }
}
