use crate::Result;

use serde::{Deserialize, Serialize};

use std::{fmt, str::FromStr};

/// Schema version. Ordering is lexicographic over (major, write, minor).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Version {
    /// Read version. Incremented for structural changes.
    pub major: u32,

    /// Write version.
    pub write: u32,

    pub minor: u32,
}

impl Version {
    pub const fn new(major: u32, write: u32, minor: u32) -> Self {
        Self {
            major,
            write,
            minor,
        }
    }
}

impl FromStr for Version {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('.');
        let mut next = || -> Result<u32> {
            let part = parts
                .next()
                .ok_or_else(|| crate::Error::invalid_schema(format!("invalid version `{s}`")))?;
            part.parse::<u32>()
                .map_err(|_| crate::Error::invalid_schema(format!("invalid version `{s}`")))
        };

        let version = Version::new(next()?, next()?, next()?);

        if parts.next().is_some() {
            return Err(crate::Error::invalid_schema(format!("invalid version `{s}`")));
        }

        Ok(version)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}.{:02}.{:02}", self.major, self.write, self.minor)
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
