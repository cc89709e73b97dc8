//! Parsed requirements: an OR of AND-ed comparators

use super::Version;
use std::cmp::Ordering;
use std::fmt;

/// Comparison operator of a single clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Op {
    /// Returns the operator as written in requirement text
    pub fn symbol(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Lt => "<",
            Op::Le => "<=",
        }
    }

    fn admits(&self, ordering: Ordering) -> bool {
        match self {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Ge => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Le => ordering != Ordering::Greater,
        }
    }

    /// Returns true for operators that bound a range from above
    pub fn is_upper_bound(&self) -> bool {
        matches!(self, Op::Lt | Op::Le)
    }
}

/// A single `(operator, version)` clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    pub op: Op,
    pub version: Version,
}

impl Comparator {
    pub fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    /// Returns true if `version` satisfies this clause
    pub fn matches(&self, version: &Version) -> bool {
        self.op.admits(version.cmp(&self.version))
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.symbol(), self.version)
    }
}

/// How pre-release versions take part in matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrereleasePolicy {
    /// Pre-releases match like any other version
    Ordinary,
    /// A pre-release only matches an alternative that names a pre-release of
    /// the same release tuple (npm, Cargo and Pub behaviour)
    SameTuple,
}

/// A parsed requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReq {
    alternatives: Vec<Vec<Comparator>>,
    prerelease: PrereleasePolicy,
}

impl VersionReq {
    /// The unconstrained requirement (`>= 0`)
    pub fn any() -> Self {
        Self {
            alternatives: vec![Vec::new()],
            prerelease: PrereleasePolicy::Ordinary,
        }
    }

    pub(crate) fn new(alternatives: Vec<Vec<Comparator>>, prerelease: PrereleasePolicy) -> Self {
        Self {
            alternatives,
            prerelease,
        }
    }

    /// Returns the OR-ed alternatives
    pub fn alternatives(&self) -> &[Vec<Comparator>] {
        &self.alternatives
    }

    /// Returns true if some alternative places no constraint at all
    pub fn is_any(&self) -> bool {
        self.alternatives.iter().any(Vec::is_empty)
    }

    /// Returns true if `version` satisfies the requirement
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|alternative| {
            alternative.iter().all(|c| c.matches(version))
                && self.prerelease_allowed(alternative, version)
        })
    }

    /// Returns true if `version` lies inside the ranges, whatever its
    /// pre-release status (ignore conditions and advisories)
    pub fn covers(&self, version: &Version) -> bool {
        self.alternatives
            .iter()
            .any(|alternative| alternative.iter().all(|c| c.matches(version)))
    }

    fn prerelease_allowed(&self, alternative: &[Comparator], version: &Version) -> bool {
        if self.prerelease == PrereleasePolicy::Ordinary || !version.is_prerelease() {
            return true;
        }
        let release = version.release();
        alternative
            .iter()
            .any(|c| c.version.is_prerelease() && c.version.release() == release)
    }

    /// Returns true if any clause names a pre-release version
    pub fn mentions_prerelease(&self) -> bool {
        self.comparators().any(|c| c.version.is_prerelease())
    }

    /// Returns the highest upper bound across alternatives, if every
    /// alternative is bounded above
    pub fn upper_bound(&self) -> Option<&Comparator> {
        let mut highest: Option<&Comparator> = None;
        for alternative in &self.alternatives {
            let bound = alternative.iter().find(|c| c.op.is_upper_bound())?;
            if highest.map_or(true, |h| bound.version > h.version) {
                highest = Some(bound);
            }
        }
        highest
    }

    fn comparators(&self) -> impl Iterator<Item = &Comparator> {
        self.alternatives.iter().flatten()
    }
}

impl fmt::Display for VersionReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .alternatives
            .iter()
            .map(|alternative| {
                if alternative.is_empty() {
                    "*".to_string()
                } else {
                    alternative
                        .iter()
                        .map(|c| c.to_string())
                        .collect::<Vec<_>>()
                        .join(" ")
                }
            })
            .collect();
        write!(f, "{}", rendered.join(" || "))
    }
}
