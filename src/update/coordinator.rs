//! Joint updates for dependencies that must move together
//!
//! Four shapes are recognised, checked in this order:
//! - requirements sharing a version property
//! - members of one declared dependency set
//! - tightly-coupled package families
//! - siblings whose peer requirement on the primary would break

use super::{PeerConflictAnalyzer, ProjectSnapshot};
use crate::domain::{Dependency, RequirementLink};
use crate::scheme::{Scheme, Version};
use tracing::debug;

/// Package names released in lockstep
const FAMILIES: &[&[&str]] = &[&["vue", "vue-template-compiler"], &["react", "react-dom"]];

/// Why the members of a plan move together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinationShape {
    SharedProperty,
    DependencySet,
    TightlyCoupled,
    PeerCascade,
    /// Only the primary dependency moves
    Single,
}

/// One dependency of a plan and the version it moves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpdate {
    pub dependency: Dependency,
    pub target: Version,
}

/// A feasible joint update, primary first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinationPlan {
    pub shape: CoordinationShape,
    pub members: Vec<PlannedUpdate>,
}

impl CoordinationPlan {
    /// The version the primary dependency moves to
    pub fn primary_target(&self) -> Option<&Version> {
        self.members.first().map(|m| &m.target)
    }
}

enum FamilyCheck {
    NotApplicable,
    Blocked,
    Planned(CoordinationPlan),
}

/// Plans updates that span more than one dependency
pub struct MultiDependencyCoordinator<'a> {
    dependency: &'a Dependency,
    project: &'a ProjectSnapshot,
    scheme: &'static dyn Scheme,
    current: Option<&'a Version>,
    peers: &'a PeerConflictAnalyzer<'a>,
}

impl<'a> MultiDependencyCoordinator<'a> {
    pub fn new(
        dependency: &'a Dependency,
        project: &'a ProjectSnapshot,
        scheme: &'static dyn Scheme,
        current: Option<&'a Version>,
        peers: &'a PeerConflictAnalyzer<'a>,
    ) -> Self {
        Self {
            dependency,
            project,
            scheme,
            current,
            peers,
        }
    }

    fn version_of(&self, dependency: &Dependency) -> Option<Version> {
        dependency
            .version
            .as_deref()
            .and_then(|v| self.scheme.parse_version(v).ok())
    }

    fn has_release(&self, dependency: &Dependency, version: &Version) -> bool {
        self.project
            .release(&dependency.name, version, self.scheme)
            .is_some()
    }

    fn is_newer(&self, version: &Version) -> bool {
        self.current.map_or(true, |current| current < version)
    }

    fn family_members(&self) -> Vec<&'a Dependency> {
        let Some(family) = FAMILIES
            .iter()
            .find(|family| family.contains(&self.dependency.name.as_str()))
        else {
            return Vec::new();
        };
        self.project
            .siblings(self.dependency)
            .filter(|d| family.contains(&d.name.as_str()))
            .collect()
    }

    fn updatable_family_members(&self, target: &Version) -> Vec<&'a Dependency> {
        self.family_members()
            .into_iter()
            .filter(|d| self.version_of(d).map_or(true, |v| &v < target))
            .collect()
    }

    /// Returns true if moving the primary alone to `target` would split a
    /// group that must stay on one version
    pub fn requires_joint_update(&self, target: &Version) -> bool {
        !self.project.linked_siblings(self.dependency).is_empty()
            || !self.updatable_family_members(target).is_empty()
    }

    /// Plans a joint update towards `target`
    ///
    /// `candidates` are the primary's eligible versions, highest first; a
    /// linked group falls back to the highest of them every member has.
    /// Returns `None` if the dependencies cannot move together.
    pub fn plan(&self, target: &Version, candidates: &[Version]) -> Option<CoordinationPlan> {
        let linked = self.project.linked_siblings(self.dependency);
        if !linked.is_empty() {
            return self.plan_linked(&linked, target, candidates);
        }

        match self.plan_family(target) {
            FamilyCheck::Planned(plan) => return Some(plan),
            FamilyCheck::Blocked => return None,
            FamilyCheck::NotApplicable => {}
        }

        self.plan_cascade(target)
    }

    fn plan_linked(
        &self,
        linked: &[&'a Dependency],
        target: &Version,
        candidates: &[Version],
    ) -> Option<CoordinationPlan> {
        let shape = if self
            .dependency
            .links()
            .any(|l| matches!(l, RequirementLink::Property { .. }))
        {
            CoordinationShape::SharedProperty
        } else {
            CoordinationShape::DependencySet
        };

        let shared = |v: &Version| linked.iter().all(|d| self.has_release(d, v));
        let version = if shared(target) {
            target.clone()
        } else {
            let fallback = candidates
                .iter()
                .filter(|v| *v <= target && self.is_newer(v))
                .find(|v| shared(v))
                .cloned();
            match fallback {
                Some(version) => version,
                None => {
                    debug!(dependency = %self.dependency.name, "no version shared by all linked dependencies");
                    return None;
                }
            }
        };

        let members = std::iter::once(self.dependency)
            .chain(linked.iter().copied())
            .map(|d| PlannedUpdate {
                dependency: d.clone(),
                target: version.clone(),
            })
            .collect();
        Some(CoordinationPlan { shape, members })
    }

    fn plan_family(&self, target: &Version) -> FamilyCheck {
        let members = self.family_members();
        if members.is_empty() {
            return FamilyCheck::NotApplicable;
        }
        if let Some(missing) = members.iter().find(|d| !self.has_release(d, target)) {
            debug!(dependency = %self.dependency.name, member = %missing.name, version = %target, "family member has no matching release");
            return FamilyCheck::Blocked;
        }

        let updatable = self.updatable_family_members(target);
        if updatable.is_empty() {
            return FamilyCheck::NotApplicable;
        }

        let members = std::iter::once(self.dependency)
            .chain(updatable)
            .map(|d| PlannedUpdate {
                dependency: d.clone(),
                target: target.clone(),
            })
            .collect();
        FamilyCheck::Planned(CoordinationPlan {
            shape: CoordinationShape::TightlyCoupled,
            members,
        })
    }

    fn plan_cascade(&self, target: &Version) -> Option<CoordinationPlan> {
        let primary = &self.dependency.name;
        let mut cascade: Vec<PlannedUpdate> = Vec::new();

        for conflict in self.peers.newly_broken(target) {
            if &conflict.required != primary {
                debug!(dependency = %primary, "unrelated peer conflict: {}", conflict);
                return None;
            }
            let sibling = self
                .project
                .siblings(self.dependency)
                .find(|d| d.name == conflict.requiring)?;
            if cascade.iter().any(|p| p.dependency.same_identity(sibling)) {
                continue;
            }
            let Some(next) = self.cascade_target(sibling, target) else {
                debug!(dependency = %primary, sibling = %sibling.name, "no release of sibling accepts {}", target);
                return None;
            };
            cascade.push(PlannedUpdate {
                dependency: sibling.clone(),
                target: next,
            });
        }

        cascade.sort_by_key(|p| self.project.position(&p.dependency));
        let shape = if cascade.is_empty() {
            CoordinationShape::Single
        } else {
            CoordinationShape::PeerCascade
        };
        let members = std::iter::once(PlannedUpdate {
            dependency: self.dependency.clone(),
            target: target.clone(),
        })
        .chain(cascade)
        .collect();
        Some(CoordinationPlan { shape, members })
    }

    /// Highest newer release of `sibling` whose peer requirement on the
    /// primary admits `target`
    fn cascade_target(&self, sibling: &Dependency, target: &Version) -> Option<Version> {
        let installed = self.version_of(sibling);
        self.project
            .releases_for(&sibling.name)
            .iter()
            .filter(|r| !r.is_withdrawn())
            .filter(|r| match r.peer_constraints.get(&self.dependency.name) {
                Some(requirement) => self
                    .scheme
                    .parse_requirement(Some(requirement))
                    .is_ok_and(|req| req.matches(target)),
                None => true,
            })
            .filter_map(|r| self.scheme.parse_version(&r.version).ok())
            .filter(|v| installed.as_ref().map_or(true, |i| i < v))
            .max()
    }

    /// The version `dependency` moves away from when it moves to `new`
    ///
    /// Without a locked version, each requirement picks the highest release
    /// it admits and the lowest of those picks wins. Returns `None` when the
    /// result equals `new`.
    pub fn previous_version(&self, dependency: &Dependency, new: &Version) -> Option<String> {
        if let Some(version) = &dependency.version {
            let unchanged = self
                .scheme
                .parse_version(version)
                .map_or(false, |v| &v == new);
            return (!unchanged).then(|| version.clone());
        }

        let releases: Vec<Version> = self
            .project
            .releases_for(&dependency.name)
            .iter()
            .filter_map(|r| self.scheme.parse_version(&r.version).ok())
            .collect();

        let previous = dependency
            .requirements
            .iter()
            .filter_map(|r| self.scheme.parse_requirement(r.text()).ok())
            .filter_map(|req| releases.iter().filter(|v| req.matches(v)).max())
            .min()?;

        (previous != new).then(|| previous.to_string())
    }
}
