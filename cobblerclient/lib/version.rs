//! Server version value used to choose between call shapes.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{wire::WireValue, CobblerError, DecodeError};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Servers newer than this accept the `resolved` argument on `get_<kind>` calls.
pub const RESOLVED_READ_SINCE: ServerVersion = ServerVersion::new(3, 3, 3);

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A `major.minor.patch` server version with lexicographic ordering.
///
/// ## Examples
///
/// ```
/// use cobblerclient::ServerVersion;
///
/// let old = ServerVersion::new(3, 3, 2);
/// let new: ServerVersion = "3.3.3".parse().unwrap();
/// assert!(new.greater_than(&old));
/// assert!(old.less_than(&new));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ServerVersion {
    /// The major component.
    pub major: u64,

    /// The minor component.
    pub minor: u64,

    /// The patch component.
    pub patch: u64,
}

#[derive(Deserialize)]
struct VersionFields {
    #[serde(default)]
    version: String,

    #[serde(default)]
    version_tuple: Vec<u64>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ServerVersion {
    /// Creates a new version.
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns `true` if `self` is strictly newer than `other`.
    pub fn greater_than(&self, other: &ServerVersion) -> bool {
        self.cmp(other) == Ordering::Greater
    }

    /// Returns `true` if `self` is strictly older than `other`.
    pub fn less_than(&self, other: &ServerVersion) -> bool {
        self.cmp(other) == Ordering::Less
    }

    /// Returns `true` if all three components match.
    pub fn equal(&self, other: &ServerVersion) -> bool {
        self == other
    }

    /// Returns `true` if any component differs.
    pub fn not_equal(&self, other: &ServerVersion) -> bool {
        self != other
    }

    /// Decodes the result of the `extended_version` call.
    ///
    /// The `version_tuple` entry is preferred; the `version` string is the fallback.
    pub fn from_extended_version(raw: &WireValue) -> Result<Self, DecodeError> {
        let extended: VersionFields = crate::wire::normalize(raw)?;
        match extended.version_tuple.as_slice() {
            [major, minor, patch, ..] => Ok(Self::new(*major, *minor, *patch)),
            _ => extended
                .version
                .parse()
                .map_err(|e: CobblerError| DecodeError::Message(e.to_string())),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl FromStr for ServerVersion {
    type Err = CobblerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let version = semver::Version::parse(s.trim())
            .map_err(|e| CobblerError::Validation(format!("invalid server version `{s}`: {e}")))?;

        Ok(Self::new(version.major, version.minor, version.patch))
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
