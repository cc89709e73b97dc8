//! Peer dependency conflict detection
//!
//! Conflicts come from release metadata (declared peer requirements) and,
//! optionally, from the output of a hypothetical install run by the
//! package manager probe.

use super::ProjectSnapshot;
use crate::domain::Dependency;
use crate::scheme::{Scheme, Version};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

static NPM6_PEER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?<requiring_dep>[^\s]+)\srequires\sa\speer\sof\s(?<required_dep>.+?)\sbut\snone\sis\sinstalled.",
    )
    .unwrap()
});

static NPM8_PEER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"npm\s(?:WARN|ERR!)\sCould\snot\sresolve\sdependency:\nnpm\s(?:WARN|ERR!)\speer\s(?<required_dep>\S+@\S+(\s\S+)?)\sfrom\s(?<requiring_dep>\S+@\S+)",
    )
    .unwrap()
});

/// An unmet peer requirement: `requiring` needs `required` at `requirement`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerConflict {
    pub required: String,
    pub requirement: String,
    pub requiring: String,
}

impl PeerConflict {
    pub fn new(
        required: impl Into<String>,
        requirement: impl Into<String>,
        requiring: impl Into<String>,
    ) -> Self {
        Self {
            required: required.into(),
            requirement: requirement.into(),
            requiring: requiring.into(),
        }
    }

    fn key(&self) -> (&str, &str) {
        (&self.required, &self.requiring)
    }
}

impl fmt::Display for PeerConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} requires {}@{}",
            self.requiring, self.required, self.requirement
        )
    }
}

/// Returns true for peer requirements that point at a repository, not a
/// version range
pub fn is_vcs_locator(requirement: &str) -> bool {
    let requirement = requirement.trim();
    requirement.contains('/')
        || requirement.starts_with("git")
        || requirement.starts_with("github:")
        || requirement.starts_with("http")
}

/// Strips a trailing `@version` while keeping a leading scope `@`
fn strip_version(spec: &str) -> &str {
    match spec.rfind('@') {
        Some(index) if index > 0 => &spec[..index],
        _ => spec,
    }
}

fn requirement_of(spec: &str) -> String {
    let requirement = match spec.rfind('@') {
        Some(index) if index > 0 => &spec[index + 1..],
        _ => "",
    };
    requirement.trim().trim_matches(['"', '\'']).to_string()
}

/// Extracts peer conflicts from package manager output
pub fn parse_peer_conflicts(output: &str) -> Vec<PeerConflict> {
    let mut conflicts = Vec::new();
    for re in [&*NPM6_PEER_RE, &*NPM8_PEER_RE] {
        for caps in re.captures_iter(output) {
            let required = caps["required_dep"].trim();
            let requiring = caps["requiring_dep"].trim();
            let conflict = PeerConflict::new(
                strip_version(required),
                requirement_of(required),
                strip_version(requiring),
            );
            if !conflicts.contains(&conflict) {
                conflicts.push(conflict);
            }
        }
    }
    conflicts
}

/// Keeps only the conflicts in `after` that were not already in `before`
pub fn prune_preexisting(before: &[PeerConflict], after: Vec<PeerConflict>) -> Vec<PeerConflict> {
    let existing: HashSet<(&str, &str)> = before.iter().map(PeerConflict::key).collect();
    after
        .into_iter()
        .filter(|c| !existing.contains(&c.key()))
        .collect()
}

/// Finds the peer requirements a hypothetical version of one dependency
/// would break or fix
pub struct PeerConflictAnalyzer<'a> {
    dependency: &'a Dependency,
    project: &'a ProjectSnapshot,
    scheme: &'static dyn Scheme,
    current: Option<Version>,
    probed: HashMap<String, Vec<PeerConflict>>,
}

impl<'a> PeerConflictAnalyzer<'a> {
    pub fn new(
        dependency: &'a Dependency,
        project: &'a ProjectSnapshot,
        scheme: &'static dyn Scheme,
        current: Option<Version>,
    ) -> Self {
        Self {
            dependency,
            project,
            scheme,
            current,
            probed: HashMap::new(),
        }
    }

    /// Record conflicts reported by the probe for `version`
    pub fn with_probed(mut self, version: &str, conflicts: Vec<PeerConflict>) -> Self {
        self.probed.insert(version.to_string(), conflicts);
        self
    }

    fn satisfies(&self, version: &Version, requirement: &str) -> bool {
        if is_vcs_locator(requirement) {
            return false;
        }
        match self.scheme.parse_requirement(Some(requirement)) {
            Ok(req) => req.matches(version),
            Err(e) => {
                debug!(dependency = %self.dependency.name, "ignoring peer requirement: {}", e);
                true
            }
        }
    }

    fn current_version_of(&self, dependency: &Dependency) -> Option<Version> {
        dependency
            .version
            .as_deref()
            .and_then(|v| self.scheme.parse_version(v).ok())
    }

    /// All peer conflicts present if the dependency were at `version`
    pub fn conflicts_for(&self, version: &Version) -> Vec<PeerConflict> {
        let mut conflicts = Vec::new();
        let name = &self.dependency.name;

        // Peers the primary's release declares on other dependencies
        if let Some(release) = self.project.release(name, version, self.scheme) {
            for (peer, requirement) in &release.peer_constraints {
                let installed = self
                    .project
                    .siblings(self.dependency)
                    .find(|d| &d.name == peer)
                    .and_then(|d| self.current_version_of(d));
                if let Some(installed) = installed {
                    if !self.satisfies(&installed, requirement) {
                        conflicts.push(PeerConflict::new(peer, requirement, name));
                    }
                }
            }
        }

        // Peers other dependencies declare on the primary
        for sibling in self.project.siblings(self.dependency) {
            let Some(sibling_version) = self.current_version_of(sibling) else {
                continue;
            };
            let Some(release) = self.project.release(&sibling.name, &sibling_version, self.scheme)
            else {
                continue;
            };
            if let Some(requirement) = release.peer_constraints.get(name) {
                if !self.satisfies(version, requirement) {
                    conflicts.push(PeerConflict::new(name, requirement, &sibling.name));
                }
            }
        }

        if let Some(probed) = self.probed.get(version.as_str()) {
            for conflict in probed {
                if !conflicts.iter().any(|c| c.key() == conflict.key()) {
                    conflicts.push(conflict.clone());
                }
            }
        }

        conflicts
    }

    /// Conflicts at `version` that do not exist at the current version
    pub fn newly_broken(&self, version: &Version) -> Vec<PeerConflict> {
        let after = self.conflicts_for(version);
        match &self.current {
            Some(current) => prune_preexisting(&self.conflicts_for(current), after),
            None => after,
        }
    }

    /// Conflicts at the current version that `version` resolves
    pub fn newly_fixed(&self, version: &Version) -> Vec<PeerConflict> {
        let Some(current) = &self.current else {
            return Vec::new();
        };
        prune_preexisting(&self.conflicts_for(version), self.conflicts_for(current))
    }
}
