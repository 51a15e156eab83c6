//! API version parsing and compatibility checking.
//!
//! The client pins a minimum API version it was written against and compares
//! it to whatever the server advertises on `/status/`. The comparison is a
//! plain ordinal comparison of `major.minor.patch` triples.

use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

/// Minimum API version required for full library functionality.
///
/// Bump this when new client features require newer API versions. It can be
/// overridden per instance via [`ClientConfig::minimum_api_version`].
///
/// [`ClientConfig::minimum_api_version`]: crate::ClientConfig::minimum_api_version
pub const MINIMUM_API_VERSION: &str = "0.2.0";

/// A `major.minor.patch` version triple.
///
/// Ordering is derived field by field, so tuple comparison gives the usual
/// semantic-version ordering for plain triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid version format: '{0}'")]
pub struct VersionParseError(pub String);

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(VersionParseError(s.to_string()));
        };
        let component =
            |part: &str| part.parse::<u64>().map_err(|_| VersionParseError(s.to_string()));
        Ok(Version {
            major: component(major)?,
            minor: component(minor)?,
            patch: component(patch)?,
        })
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Whether `api_version` satisfies `min_version`.
pub fn is_version_compatible(
    api_version: &str,
    min_version: &str,
) -> Result<bool, VersionParseError> {
    let api = api_version.parse::<Version>()?;
    let min = min_version.parse::<Version>()?;
    Ok(api >= min)
}

/// Non-fatal outcome of the best-effort version probe.
///
/// Never an error: construction succeeds regardless of what the probe finds.
/// At most one warning is recorded per probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionWarning {
    /// The server advertised a version older than the pinned minimum.
    Incompatible { server: String, minimum: String },
    /// The server did not advertise a recognizable version.
    Undetermined,
}

impl Display for VersionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionWarning::Incompatible { server, minimum } => write!(
                f,
                "API version compatibility warning: server reports version {server} \
                 but this client requires at least {minimum}; some operations may fail"
            ),
            VersionWarning::Undetermined => {
                write!(f, "Could not determine API version from the status endpoint")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_plain_triples() {
        assert_eq!("1.2.3".parse::<Version>().unwrap(), Version {
            major: 1,
            minor: 2,
            patch: 3
        });
        assert_eq!("0.1.0".parse::<Version>().unwrap(), Version {
            major: 0,
            minor: 1,
            patch: 0
        });
        assert_eq!("10.20.30".parse::<Version>().unwrap(), Version {
            major: 10,
            minor: 20,
            patch: 30
        });
    }

    #[test]
    fn rejects_wrong_component_counts() {
        assert!("1.2".parse::<Version>().is_err());
        assert!("1.2.3.4".parse::<Version>().is_err());
        assert!("1.a.3".parse::<Version>().is_err());
        assert!("".parse::<Version>().is_err());
    }

    #[test]
    fn compatibility_is_ordinal() {
        assert!(is_version_compatible("1.2.3", "1.2.3").unwrap());
        assert!(is_version_compatible("1.3.0", "1.2.3").unwrap());
        assert!(is_version_compatible("2.0.0", "1.9.9").unwrap());
        assert!(is_version_compatible("1.2.4", "1.2.3").unwrap());
        assert!(!is_version_compatible("1.2.2", "1.2.3").unwrap());
        assert!(!is_version_compatible("1.1.9", "1.2.0").unwrap());
        assert!(!is_version_compatible("0.9.9", "1.0.0").unwrap());
    }

    #[test]
    fn compatibility_surfaces_parse_errors() {
        assert!(is_version_compatible("1.2", MINIMUM_API_VERSION).is_err());
    }
}
