use crate::error::{Result, UpdaterError};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Release version as a `major.minor.patch` triple.
///
/// Ordering is numeric and lexicographic over the components, major first,
/// so `4.10.0` sorts after `4.9.9` and `2.03.1` equals `2.3.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Create a new version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse a dotted `X.Y.Z` string.
    ///
    /// Exactly three components are required and each must be a run of ASCII
    /// digits; signs, whitespace and suffixes such as `rc1` are rejected.
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split('.').collect();
        if parts.len() != 3 {
            return Err(UpdaterError::parse(format!(
                "Invalid version format: '{}' - expected X.Y.Z",
                text
            )));
        }

        let major = parse_component(text, "major", parts[0])?;
        let minor = parse_component(text, "minor", parts[1])?;
        let patch = parse_component(text, "patch", parts[2])?;

        Ok(Version {
            major,
            minor,
            patch,
        })
    }

    /// True when `self` sorts strictly before `other`.
    pub fn is_older_than(&self, other: &Version) -> bool {
        compare(self, other) == Ordering::Less
    }

    /// True when `self` sorts strictly after `other`.
    pub fn is_newer_than(&self, other: &Version) -> bool {
        compare(self, other) == Ordering::Greater
    }
}

fn parse_component(text: &str, name: &str, part: &str) -> Result<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UpdaterError::parse(format!(
            "Invalid {} version component '{}' in '{}'",
            name, part, text
        )));
    }
    part.parse::<u32>().map_err(|_| {
        UpdaterError::parse(format!(
            "Version component '{}' in '{}' is out of range",
            part, text
        ))
    })
}

impl FromStr for Version {
    type Err = UpdaterError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Total order used for candidate filtering and changelog sorting.
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.major
        .cmp(&b.major)
        .then(a.minor.cmp(&b.minor))
        .then(a.patch.cmp(&b.patch))
}

/// `a` is older than `b`.
pub fn is_older(a: &Version, b: &Version) -> bool {
    a.is_older_than(b)
}

/// `a` is newer than `b`.
pub fn is_newer(a: &Version, b: &Version) -> bool {
    a.is_newer_than(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        let v = Version::parse("4.10.2").unwrap();
        assert_eq!(v.major, 4);
        assert_eq!(v.minor, 10);
        assert_eq!(v.patch, 2);
    }

    #[test]
    fn test_version_parse_leading_zeros() {
        assert_eq!(Version::parse("2.03.01").unwrap(), Version::new(2, 3, 1));
    }

    #[test]
    fn test_version_parse_invalid() {
        assert!(Version::parse("1.2").is_err());
        assert!(Version::parse("1.2.3.4").is_err());
        assert!(Version::parse("4.12.0rc1").is_err());
        assert!(Version::parse("1..3").is_err());
        assert!(Version::parse("+1.2.3").is_err());
        assert!(Version::parse(" 1.2.3").is_err());
        assert!(Version::parse("v1.2.3").is_err());
        assert!(Version::parse("").is_err());
        assert!(Version::parse("99999999999.0.0").is_err());
    }

    #[test]
    fn test_parse_error_is_parse_variant() {
        match Version::parse("x.y.z") {
            Err(UpdaterError::Parse(msg)) => assert!(msg.contains("x.y.z")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_compare_numeric_not_lexical() {
        let a = Version::new(4, 9, 9);
        let b = Version::new(4, 10, 0);
        assert_eq!(compare(&a, &b), Ordering::Less);
        assert_eq!(compare(&b, &a), Ordering::Greater);
        assert_eq!(compare(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_compare_major_first() {
        assert!(is_older(&Version::new(1, 99, 99), &Version::new(2, 0, 0)));
        assert!(is_newer(&Version::new(2, 0, 0), &Version::new(1, 99, 99)));
    }

    #[test]
    fn test_equal_versions_are_neither_older_nor_newer() {
        let v = Version::new(2, 3, 1);
        assert!(!v.is_older_than(&v));
        assert!(!v.is_newer_than(&v));
    }

    #[test]
    fn test_version_display() {
        let v = Version::parse("004.010.002").unwrap();
        assert_eq!(v.to_string(), "4.10.2");
    }

    #[test]
    fn test_from_str() {
        let v: Version = "1.2.3".parse().unwrap();
        assert_eq!(v, Version::new(1, 2, 3));
    }
}
