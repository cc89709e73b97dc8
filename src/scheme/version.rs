//! Scheme-independent version value
//!
//! A `Version` remembers its canonical spelling (trimmed input without a
//! leading `v` or `=`) and carries a scheme-specific comparison key.

use super::java::JavaVersion;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Size of the step between two versions, by first differing segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BumpKind {
    Major,
    Minor,
    Patch,
}

#[derive(Debug, Clone)]
enum VersionKind {
    Semantic {
        version: semver::Version,
        precision: usize,
    },
    Java(JavaVersion),
}

/// An ordered, parsed version
///
/// Equality follows ordering, so `1.0` and `1.0.0` are equal under both
/// schemes even though they display differently.
#[derive(Debug, Clone)]
pub struct Version {
    canonical: String,
    kind: VersionKind,
}

impl Version {
    pub(crate) fn from_semver(
        canonical: impl Into<String>,
        version: semver::Version,
        precision: usize,
    ) -> Self {
        Self {
            canonical: canonical.into(),
            kind: VersionKind::Semantic { version, precision },
        }
    }

    pub(crate) fn from_java(canonical: impl Into<String>, version: JavaVersion) -> Self {
        Self {
            canonical: canonical.into(),
            kind: VersionKind::Java(version),
        }
    }

    /// Builds a plain `major.minor.patch` semantic version
    pub fn from_parts(major: u64, minor: u64, patch: u64) -> Self {
        Self::from_semver(
            format!("{}.{}.{}", major, minor, patch),
            semver::Version::new(major, minor, patch),
            3,
        )
    }

    /// Returns the canonical spelling
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Returns the numeric segments as written (`1.2` gives `[1, 2]`)
    pub fn segments(&self) -> Vec<u64> {
        match &self.kind {
            VersionKind::Semantic { version, precision } => {
                [version.major, version.minor, version.patch][..*precision].to_vec()
            }
            VersionKind::Java(java) => java.numeric_prefix().to_vec(),
        }
    }

    /// Returns the numeric release tuple used to relate pre-releases
    pub fn release(&self) -> Vec<u64> {
        match &self.kind {
            VersionKind::Semantic { version, .. } => {
                vec![version.major, version.minor, version.patch]
            }
            VersionKind::Java(java) => {
                let mut release = java.numeric_prefix().to_vec();
                while release.len() > 1 && release.last() == Some(&0) {
                    release.pop();
                }
                release
            }
        }
    }

    /// Returns true if the version carries a pre-release marker
    pub fn is_prerelease(&self) -> bool {
        match &self.kind {
            VersionKind::Semantic { version, .. } => !version.pre.is_empty(),
            VersionKind::Java(java) => java.is_prerelease(),
        }
    }

    /// Returns the underlying semver value for semantic versions
    pub fn semver(&self) -> Option<&semver::Version> {
        match &self.kind {
            VersionKind::Semantic { version, .. } => Some(version),
            VersionKind::Java(_) => None,
        }
    }

    /// Classifies the step from `older` to `self`
    pub fn bump_from(&self, older: &Version) -> BumpKind {
        let new = self.release();
        let old = older.release();
        let at = |segments: &[u64], index: usize| segments.get(index).copied().unwrap_or(0);
        if at(&new, 0) != at(&old, 0) {
            BumpKind::Major
        } else if at(&new, 1) != at(&old, 1) {
            BumpKind::Minor
        } else {
            BumpKind::Patch
        }
    }

    fn rank(&self) -> u8 {
        match self.kind {
            VersionKind::Semantic { .. } => 0,
            VersionKind::Java(_) => 1,
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.kind, &other.kind) {
            (VersionKind::Semantic { version: a, .. }, VersionKind::Semantic { version: b, .. }) => {
                a.cmp_precedence(b)
            }
            (VersionKind::Java(a), VersionKind::Java(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical)
    }
}
