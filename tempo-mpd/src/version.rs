use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::MpdError;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self { major, minor, patch }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Accepts `major.minor` and `major.minor.patch`. A missing patch component
/// is treated as zero, `0.23` therefore equals `0.23.0`.
impl FromStr for Version {
    type Err = MpdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('.');
        let major = parts
            .next()
            .filter(|v| !v.is_empty())
            .ok_or(MpdError::Malformed(format!("Cannot parse major version from '{s}'")))?;
        let minor = parts
            .next()
            .ok_or(MpdError::Malformed(format!("Cannot parse minor version from '{s}'")))?;
        let patch = parts.next().unwrap_or("0");
        if parts.next().is_some() {
            return Err(MpdError::Malformed(format!("Too many version components in '{s}'")));
        }

        Ok(Self { major: major.parse()?, minor: minor.parse()?, patch: patch.parse()? })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
