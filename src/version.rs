//! Release version validation
//!
//! Release versions are plain numeric-dotted strings: a major component of up
//! to four digits, an optional minor of up to four digits and an optional
//! patch of up to six digits. There is no prerelease or build metadata.
//!
//! # Examples
//!
//! ```
//! use addon_release::ReleaseVersion;
//!
//! let version = ReleaseVersion::parse("2024.10.1").unwrap();
//! assert_eq!(version.as_str(), "2024.10.1");
//! assert!(ReleaseVersion::parse("v1.0").is_err());
//! ```

use crate::{Error, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Pattern every release version must match in full
pub const VERSION_PATTERN: &str = r"^\d{1,4}(\.\d{1,4}(\.\d{1,6})?)?$";

fn version_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(VERSION_PATTERN).expect("valid regex"))
}

/// Check a version string against [`VERSION_PATTERN`]
pub fn is_valid_version(version: &str) -> bool {
    // `\d` is Unicode-aware in the regex crate; release versions are ASCII only.
    version.is_ascii() && version_regex().is_match(version)
}

/// A validated release version string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    pub fn parse(version: &str) -> Result<Self> {
        if !is_valid_version(version) {
            return Err(Error::InvalidVersion {
                version: version.to_string(),
            });
        }
        Ok(Self(version.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ReleaseVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ReleaseVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_valid_versions() {
        for version in ["1", "1.2", "1.2.3", "2024.10.1", "0", "9999.9999.999999", "0.0.0"] {
            assert!(
                ReleaseVersion::parse(version).is_ok(),
                "{} should be accepted",
                version
            );
        }
    }

    #[test]
    fn test_rejects_invalid_versions() {
        for version in [
            "",
            "v1.0",
            "1.2.3.4",
            "1.22222",
            "12345",
            "1.2.3333333",
            "1.",
            ".1",
            "1..2",
            "1.2-beta",
            " 1.2",
            "1.2\n",
            "١.٢",
        ] {
            assert!(
                ReleaseVersion::parse(version).is_err(),
                "{:?} should be rejected",
                version
            );
        }
    }

    #[test]
    fn test_error_names_pattern() {
        let err = ReleaseVersion::parse("v1.0").unwrap_err();
        let message = err.to_string();
        assert!(message.contains(VERSION_PATTERN));
        assert!(message.contains("v1.0"));
    }

    #[test]
    fn test_from_str_and_display() {
        let version: ReleaseVersion = "3.1".parse().unwrap();
        assert_eq!(version.to_string(), "3.1");
        assert_eq!(version.as_ref(), "3.1");
    }
}
