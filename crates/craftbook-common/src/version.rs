//! Game data version labels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a version label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid game version label: {0}")]
pub struct ParseVersionError(pub String);

/// Version of the game data a table bundle was built from.
///
/// Labels follow the game's `major.minor` or `major.minor.patch` form,
/// e.g. `1.15` or `1.16.5`. Used for logging and attribution only; the
/// calculator itself is version-agnostic.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GameVersion {
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
    /// Patch version (zero when the label omits it)
    pub patch: u16,
}

impl GameVersion {
    /// Creates a version label.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

impl FromStr for GameVersion {
    type Err = ParseVersionError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let mut parts = label.split('.');
        let mut next = || -> Result<u16, ParseVersionError> {
            parts
                .next()
                .and_then(|part| part.parse().ok())
                .ok_or_else(|| ParseVersionError(label.to_owned()))
        };
        let major = next()?;
        let minor = next()?;
        let patch = match parts.next() {
            Some(part) => part
                .parse()
                .map_err(|_| ParseVersionError(label.to_owned()))?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(ParseVersionError(label.to_owned()));
        }
        Ok(Self::new(major, minor, patch))
    }
}
