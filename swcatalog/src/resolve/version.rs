//! Ordering of product version strings.
//!
//! Apple versions are dotted numbers with two to four components
//! (`10.9`, `10.15.7`, `10.13.6.1`). They are compared numerically: the first
//! three components are padded and parsed as a semver version. Strings that
//! are not dotted numbers sort below every numeric version and are ordered
//! among themselves as plain strings.

use std::cmp::Ordering;

use semver::Version;

/// Comparable form of a version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionKey {
    numeric: Option<Version>,
    raw: String,
}

impl VersionKey {
    pub fn new(raw: &str) -> Self {
        Self {
            numeric: numeric_version(raw),
            raw: raw.to_string(),
        }
    }
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numeric
            .cmp(&other.numeric)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn numeric_version(raw: &str) -> Option<Version> {
    let parts: Vec<&str> = raw.trim().split('.').collect();
    if parts.is_empty() || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    let mut padded: Vec<&str> = parts.iter().take(3).copied().collect();
    while padded.len() < 3 {
        padded.push("0");
    }

    // Leading zeros are rejected by semver; normalise through integers.
    let numbers: Option<Vec<u64>> = padded.iter().map(|p| p.parse().ok()).collect();
    let numbers = numbers?;
    Some(Version::new(numbers[0], numbers[1], numbers[2]))
}
