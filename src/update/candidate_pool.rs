//! Candidate release filtering
//!
//! Filters run in a fixed order:
//! 1. unparseable, yanked and deprecated releases
//! 2. pre-releases unrelated to the current track
//! 3. ignore conditions
//! 4. cooldown windows (with a security exemption)
//!
//! Survivors are sorted highest first.

use super::{CooldownConfig, VulnerabilityIndex};
use crate::domain::{Dependency, Release};
use crate::error::EngineError;
use crate::scheme::{Scheme, Version, VersionReq};
use chrono::{DateTime, Utc};
use tracing::debug;

/// A release that survived parsing, with its parsed version
#[derive(Debug, Clone)]
pub struct Candidate {
    pub version: Version,
    pub release: Release,
}

/// Everything the pool filters on
pub struct PoolInput<'a> {
    pub dependency: &'a Dependency,
    pub scheme: &'a dyn Scheme,
    pub current: Option<&'a Version>,
    pub requirements: &'a [VersionReq],
    pub ignored: &'a [VersionReq],
    pub raise_on_ignored: bool,
    pub cooldown: Option<&'a CooldownConfig>,
    pub vulnerabilities: &'a VulnerabilityIndex,
    pub now: DateTime<Utc>,
}

/// The filtered releases of one dependency, highest first
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
}

impl CandidatePool {
    /// Build the pool from raw releases
    ///
    /// Fails with `AllVersionsIgnored` only when `raise_on_ignored` is set and
    /// the ignore conditions removed every newer release.
    pub fn build(input: &PoolInput<'_>, releases: &[Release]) -> Result<Self, EngineError> {
        let name = &input.dependency.name;

        let mut candidates: Vec<Candidate> = releases
            .iter()
            .filter(|r| {
                if r.is_withdrawn() {
                    debug!(dependency = %name, version = %r.version, "skipping withdrawn release");
                    return false;
                }
                true
            })
            .filter_map(|r| match input.scheme.parse_version(&r.version) {
                Ok(version) => Some(Candidate {
                    version,
                    release: r.clone(),
                }),
                Err(_) => {
                    debug!(dependency = %name, version = %r.version, "skipping unparseable release");
                    None
                }
            })
            .collect();

        candidates.retain(|c| !c.version.is_prerelease() || prerelease_related(input, &c.version));

        Self::apply_ignore(input, &mut candidates)?;
        Self::apply_cooldown(input, &mut candidates);

        candidates.sort_by(|a, b| b.version.cmp(&a.version));
        candidates.dedup_by(|a, b| a.version == b.version);

        Ok(Self { candidates })
    }

    fn apply_ignore(input: &PoolInput<'_>, candidates: &mut Vec<Candidate>) -> Result<(), EngineError> {
        if input.ignored.is_empty() {
            return Ok(());
        }
        let is_ignored = |v: &Version| input.ignored.iter().any(|req| req.covers(v));

        let newer = candidates.iter().filter(|c| is_newer(input.current, &c.version)).count();
        let newer_kept = candidates
            .iter()
            .filter(|c| is_newer(input.current, &c.version) && !is_ignored(&c.version))
            .count();

        if input.raise_on_ignored && newer > 0 && newer_kept == 0 {
            return Err(EngineError::all_versions_ignored(&input.dependency.name));
        }

        candidates.retain(|c| {
            let ignored = is_ignored(&c.version);
            if ignored {
                debug!(dependency = %input.dependency.name, version = %c.version, "ignored by condition");
            }
            !ignored
        });
        Ok(())
    }

    fn apply_cooldown(input: &PoolInput<'_>, candidates: &mut Vec<Candidate>) {
        let Some(cooldown) = input.cooldown else {
            return;
        };
        if !cooldown.applies_to(&input.dependency.name) {
            return;
        }

        let cooling = |c: &Candidate| {
            is_newer(input.current, &c.version)
                && cooldown.is_cooling(
                    c.release.released_at,
                    input.current.map(|current| c.version.bump_from(current)),
                    input.now,
                )
        };

        // A vulnerable dependency keeps its lowest fix even while cooling
        let vulnerable = input
            .current
            .is_some_and(|current| input.vulnerabilities.is_vulnerable(current));
        let mut exempt: Option<Version> = None;
        if vulnerable {
            let mut fixes: Vec<&Candidate> = candidates
                .iter()
                .filter(|c| is_newer(input.current, &c.version))
                .filter(|c| !input.vulnerabilities.is_vulnerable(&c.version))
                .collect();
            fixes.sort_by(|a, b| a.version.cmp(&b.version));
            if !fixes.is_empty() && fixes.iter().all(|c| cooling(c)) {
                exempt = fixes.first().map(|c| c.version.clone());
            }
        }

        candidates.retain(|c| {
            if exempt.as_ref() == Some(&c.version) {
                debug!(dependency = %input.dependency.name, version = %c.version, "security fix exempt from cooldown");
                return true;
            }
            let held = cooling(c);
            if held {
                debug!(dependency = %input.dependency.name, version = %c.version, "held back by cooldown");
            }
            !held
        });
    }

    /// All candidates, highest first
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Candidate versions, highest first
    pub fn versions(&self) -> impl Iterator<Item = &Version> {
        self.candidates.iter().map(|c| &c.version)
    }

    /// The highest candidate
    pub fn latest(&self) -> Option<&Version> {
        self.candidates.first().map(|c| &c.version)
    }

    /// Candidates satisfying every requirement, highest first
    pub fn satisfying<'a>(
        &'a self,
        requirements: &'a [VersionReq],
    ) -> impl Iterator<Item = &'a Version> + 'a {
        self.versions()
            .filter(move |v| requirements.iter().all(|req| req.matches(v)))
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Returns true if `candidate` is above `current`; everything is newer than
/// an unknown version
fn is_newer(current: Option<&Version>, candidate: &Version) -> bool {
    current.map_or(true, |current| current < candidate)
}

/// Pre-releases are kept when nothing is locked, or when the dependency
/// already tracks one on the same release tuple: the current version is such
/// a pre-release, or a requirement names one.
fn prerelease_related(input: &PoolInput<'_>, version: &Version) -> bool {
    let Some(current) = input.current else {
        return true;
    };
    let release = version.release();
    if current.is_prerelease() && current.release() == release {
        return true;
    }
    input.requirements.iter().any(|req| {
        req.alternatives()
            .iter()
            .flatten()
            .any(|c| c.version.is_prerelease() && c.version.release() == release)
    })
}
