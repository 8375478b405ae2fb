use crate::error::{Error, ErrorKind};
use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Format version written into every new archive.
pub const CURRENT_VERSION: VersionTag = VersionTag::new(1, 2, 0);

/// A `major.minor.patch` archive format version.
///
/// Only the major component decides compatibility: archives written with a
/// different minor or patch version are always accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VersionTag {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl VersionTag {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Whether an archive tagged `self` can be read by a reader supporting `supported`.
    #[inline]
    #[must_use]
    pub fn is_compatible_with(&self, supported: &VersionTag) -> bool {
        self.major == supported.major
    }
}

impl Default for VersionTag {
    fn default() -> Self {
        CURRENT_VERSION
    }
}

impl Display for VersionTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for VersionTag {
    type Err = Error;

    /// Parse a dotted numeric tag. Missing trailing components count as zero,
    /// so `"1"` and `"1.2"` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::from(ErrorKind::InvalidVersionTag(s.to_string()));
        let mut parts = [0u32; 3];
        let mut count = 0;
        for part in s.trim().split('.') {
            let slot = parts.get_mut(count).ok_or_else(invalid)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            *slot = part.parse().map_err(|_| invalid())?;
            count += 1;
        }
        let [major, minor, patch] = parts;
        Ok(Self { major, minor, patch })
    }
}

impl Serialize for VersionTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|_| D::Error::custom(format!("invalid version tag: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.0", VersionTag::new(1, 2, 0))]
    #[case("1.10.3", VersionTag::new(1, 10, 3))]
    #[case("2", VersionTag::new(2, 0, 0))]
    #[case("1.3", VersionTag::new(1, 3, 0))]
    #[case(" 1.2.0\n", VersionTag::new(1, 2, 0))]
    fn test_parse(#[case] input: &str, #[case] expected: VersionTag) {
        assert_eq!(input.parse::<VersionTag>().unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("v1.2.0")]
    #[case("1.2.0.4")]
    #[case("1..0")]
    #[case("1.2.0-beta")]
    #[case("-1.0.0")]
    fn test_parse_invalid(#[case] input: &str) {
        let err = input.parse::<VersionTag>().unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidVersionTag(input.to_string()));
    }

    #[rstest]
    #[case("1.2.0", true)]
    #[case("1.0.0", true)]
    #[case("1.99.7", true)]
    #[case("0.9.0", false)]
    #[case("2.0.0", false)]
    fn test_compatibility(#[case] found: &str, #[case] compatible: bool) {
        let found: VersionTag = found.parse().unwrap();
        assert_eq!(found.is_compatible_with(&CURRENT_VERSION), compatible);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&VersionTag::new(1, 2, 0)).unwrap();
        assert_eq!(json, "\"1.2.0\"");
        let parsed: VersionTag = serde_json::from_str("\"1.4\"").unwrap();
        assert_eq!(parsed, VersionTag::new(1, 4, 0));
        assert!(serde_json::from_str::<VersionTag>("\"latest\"").is_err());
    }
}
