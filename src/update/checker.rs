//! Update decisions for a single dependency
//!
//! The checker is built once per dependency from an immutable project
//! snapshot. Every query is a pure function of that input: the candidate
//! pool, the parsed requirements, the advisories and the peer analysis.

use super::{
    CandidatePool, CoordinationPlan, CoordinationShape, MultiDependencyCoordinator, PeerConflict,
    PeerConflictAnalyzer, PlannedUpdate, PoolInput, ProjectSnapshot, RequirementsUpdater,
    VulnerabilityIndex,
};
use crate::config::UpdateSettings;
use crate::domain::{
    CanUpdate, Dependency, Release, Requirement, SecurityAdvisory, UnlockPolicy, UpdateDecision,
    UpdateStrategy, UpdatedDependency,
};
use crate::error::EngineError;
use crate::scheme::{scheme_for, Scheme, Version, VersionReq};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static COMMIT_SHA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-f]{7,40}$").unwrap());

fn looks_like_commit(version: &str) -> bool {
    COMMIT_SHA_RE.is_match(version) && version.chars().any(|c| c.is_ascii_alphabetic())
}

/// Answers update questions for one dependency
pub struct UpdateChecker<'a> {
    dependency: &'a Dependency,
    project: &'a ProjectSnapshot,
    settings: &'a UpdateSettings,
    scheme: &'static dyn Scheme,
    current: Option<Version>,
    requirements: Vec<VersionReq>,
    vulnerabilities: VulnerabilityIndex,
    pool: CandidatePool,
    dist_tag: DistTag,
    peers: PeerConflictAnalyzer<'a>,
    updater: RequirementsUpdater,
}

impl std::fmt::Debug for UpdateChecker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateChecker")
            .field("dependency", &self.dependency)
            .field("current", &self.current)
            .field("requirements", &self.requirements)
            .finish_non_exhaustive()
    }
}

/// What the registry's dist-tags say about the target version
#[derive(Debug)]
enum DistTag {
    /// No tag applies; the newest candidate wins
    Untagged,
    /// The `latest` tag, which caps how far the dependency moves
    Latest(Version),
    /// A requirement names a tag; `None` if it is missing or withdrawn
    Requested(Option<Version>),
}

impl<'a> UpdateChecker<'a> {
    /// Create a checker evaluated at the current time
    pub fn new(
        dependency: &'a Dependency,
        project: &'a ProjectSnapshot,
        settings: &'a UpdateSettings,
        advisories: &[SecurityAdvisory],
    ) -> Result<Self, EngineError> {
        Self::with_time(dependency, project, settings, advisories, Utc::now())
    }

    /// Create a checker with a fixed time (for testing cooldowns)
    ///
    /// Fails if the current version, a requirement or an ignore condition
    /// cannot be parsed, or if every newer release is ignored while
    /// `raise_on_ignored` is set.
    pub fn with_time(
        dependency: &'a Dependency,
        project: &'a ProjectSnapshot,
        settings: &'a UpdateSettings,
        advisories: &[SecurityAdvisory],
        now: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        let scheme = scheme_for(dependency.package_manager);
        let current = resolve_current(dependency, project, scheme)?;

        let requirements = dependency
            .requirements
            .iter()
            .map(|r| scheme.parse_requirement(r.text()))
            .collect::<Result<Vec<_>, _>>()?;

        let ignored = settings
            .ignore_conditions(&dependency.name)
            .iter()
            .map(|condition| {
                scheme.parse_requirement(Some(condition)).map_err(|e| {
                    EngineError::invalid_ignore_condition(&dependency.name, condition, e.to_string())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let vulnerabilities = VulnerabilityIndex::new(dependency, advisories, scheme);

        let pool = CandidatePool::build(
            &PoolInput {
                dependency,
                scheme,
                current: current.as_ref(),
                requirements: &requirements,
                ignored: &ignored,
                raise_on_ignored: settings.raise_on_ignored,
                cooldown: settings.cooldown.as_ref(),
                vulnerabilities: &vulnerabilities,
                now,
            },
            project.releases_for(&dependency.name),
        )?;

        let dist_tag = resolve_dist_tag(
            dependency,
            project.releases_for(&dependency.name),
            scheme,
            current.as_ref(),
            &pool,
        );

        let peers = PeerConflictAnalyzer::new(dependency, project, scheme, current.clone());

        Ok(Self {
            dependency,
            project,
            settings,
            scheme,
            current,
            requirements,
            vulnerabilities,
            pool,
            dist_tag,
            peers,
            updater: RequirementsUpdater::new(dependency.package_manager),
        })
    }

    /// Record peer conflicts a probe reported for `version`
    pub fn with_probed(mut self, version: &str, conflicts: Vec<PeerConflict>) -> Self {
        self.peers = self.peers.with_probed(version, conflicts);
        self
    }

    pub fn dependency(&self) -> &Dependency {
        self.dependency
    }

    pub fn current_version(&self) -> Option<&Version> {
        self.current.as_ref()
    }

    fn is_newer(&self, version: &Version) -> bool {
        self.current.as_ref().map_or(true, |current| current < version)
    }

    fn breaks_no_peers(&self, version: &Version) -> bool {
        self.peers.newly_broken(version).is_empty()
    }

    fn coordinator(&self) -> MultiDependencyCoordinator<'_> {
        MultiDependencyCoordinator::new(
            self.dependency,
            self.project,
            self.scheme,
            self.current.as_ref(),
            &self.peers,
        )
    }

    /// Candidates the dependency may move to, highest first
    ///
    /// A requested dist-tag allows only its version; the `latest` tag caps
    /// the pool.
    fn eligible(&self) -> Vec<&Version> {
        match &self.dist_tag {
            DistTag::Untagged => self.pool.versions().collect(),
            DistTag::Latest(cap) => self.pool.versions().filter(|v| *v <= cap).collect(),
            DistTag::Requested(version) => version.iter().collect(),
        }
    }

    /// Newest eligible version upstream, ignoring requirements
    ///
    /// Falls back to the current version when nothing newer survives the
    /// filters.
    pub fn latest_version(&self) -> Option<Version> {
        match (self.eligible().first(), &self.current) {
            (Some(latest), Some(current)) if *latest < current => Some(current.clone()),
            (Some(latest), _) => Some((*latest).clone()),
            (None, current) => current.clone(),
        }
    }

    /// Newest version admitted by every requirement without breaking a peer
    pub fn latest_resolvable_version(&self) -> Option<Version> {
        let requested = matches!(self.dist_tag, DistTag::Requested(_));
        self.eligible()
            .into_iter()
            .filter(|v| requested || self.requirements.iter().all(|req| req.matches(v)))
            .find(|v| self.breaks_no_peers(v))
            .cloned()
    }

    /// Returns true if the current version matches an advisory
    pub fn is_vulnerable(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|current| self.vulnerabilities.is_vulnerable(current))
    }

    fn security_fixes(&self) -> Result<impl Iterator<Item = &Version>, EngineError> {
        if !self.is_vulnerable() {
            return Err(EngineError::not_vulnerable(
                &self.dependency.name,
                self.dependency.version_str(),
            ));
        }
        let mut fixes: Vec<&Version> = self
            .pool
            .versions()
            .filter(|v| self.is_newer(v) && !self.vulnerabilities.is_vulnerable(v))
            .collect();
        fixes.sort();
        Ok(fixes.into_iter())
    }

    /// Lowest non-vulnerable version above current
    ///
    /// Calling this for a dependency that is not vulnerable is a caller bug
    /// and fails with `DependencyNotVulnerable`.
    pub fn lowest_security_fix_version(&self) -> Result<Option<Version>, EngineError> {
        Ok(self.security_fixes()?.next().cloned())
    }

    /// Like [`Self::lowest_security_fix_version`], restricted to versions
    /// the current requirements admit without breaking a peer
    pub fn lowest_resolvable_security_fix_version(&self) -> Result<Option<Version>, EngineError> {
        let requirements = &self.requirements;
        Ok(self
            .security_fixes()?
            .find(|v| requirements.iter().all(|r| r.matches(v)) && self.breaks_no_peers(v))
            .cloned())
    }

    /// Target for a lockfile-only update
    fn resolvable_target(&self) -> Option<Version> {
        let target = if self.is_vulnerable() {
            self.lowest_resolvable_security_fix_version().ok().flatten()
        } else {
            self.latest_resolvable_version()
        };
        target.filter(|v| self.is_newer(v))
    }

    /// Target when only this dependency's requirements may change
    fn own_target(&self) -> Option<Version> {
        let target = if self.is_vulnerable() {
            self.security_fixes()
                .ok()?
                .find(|v| self.breaks_no_peers(v))
                .cloned()
        } else {
            self.eligible()
                .into_iter()
                .find(|v| self.breaks_no_peers(v))
                .cloned()
        }?;
        if !self.is_newer(&target) {
            return None;
        }
        if self.coordinator().requires_joint_update(&target) {
            debug!(dependency = %self.dependency.name, version = %target, "update needs other dependencies to move");
            return None;
        }
        Some(target)
    }

    /// Target when other dependencies may move too
    fn all_target(&self) -> Option<Version> {
        let target = if self.is_vulnerable() {
            self.security_fixes().ok()?.next().cloned()
        } else {
            self.eligible().first().map(|v| (*v).clone())
        }?;
        self.is_newer(&target).then_some(target)
    }

    fn single(&self, target: Version) -> CoordinationPlan {
        CoordinationPlan {
            shape: CoordinationShape::Single,
            members: vec![PlannedUpdate {
                dependency: self.dependency.clone(),
                target,
            }],
        }
    }

    fn rewrite(&self, member: &Dependency, target: &Version) -> Vec<Requirement> {
        self.updater
            .update(&member.requirements, target, self.settings.strategy, None)
    }

    /// Returns true if the member's rewritten requirements admit `target`
    fn admits_after_rewrite(&self, member: &Dependency, target: &Version) -> bool {
        let scheme = scheme_for(member.package_manager);
        self.rewrite(member, target).iter().all(|r| {
            scheme
                .parse_requirement(r.text())
                .is_ok_and(|req| req.matches(target))
        })
    }

    /// The plan materialised at `policy`, if the update is feasible there
    pub fn plan(&self, policy: UnlockPolicy) -> Option<CoordinationPlan> {
        if self.dependency.metadata.bundled {
            return None;
        }
        match policy {
            UnlockPolicy::None => {
                self.current.as_ref()?;
                self.resolvable_target().map(|target| self.single(target))
            }
            UnlockPolicy::Own => {
                let target = self.own_target()?;
                if !self.admits_after_rewrite(self.dependency, &target) {
                    return None;
                }
                if self.current.is_none()
                    && self.rewrite(self.dependency, &target) == self.dependency.requirements
                {
                    return None;
                }
                Some(self.single(target))
            }
            UnlockPolicy::All => {
                let target = self.all_target()?;
                let candidates: Vec<Version> = self.pool.versions().cloned().collect();
                let plan = self.coordinator().plan(&target, &candidates)?;
                let feasible = plan
                    .members
                    .iter()
                    .all(|m| self.admits_after_rewrite(&m.dependency, &m.target));
                feasible.then_some(plan)
            }
        }
    }

    /// Returns true if an update is feasible at `policy`
    pub fn can_update(&self, policy: UnlockPolicy) -> bool {
        self.plan(policy).is_some()
    }

    /// The dependencies that change at `policy`, primary first, no-ops
    /// filtered out
    pub fn updated_dependencies(&self, policy: UnlockPolicy) -> Vec<UpdatedDependency> {
        let Some(plan) = self.plan(policy) else {
            return Vec::new();
        };
        let coordinator = self.coordinator();
        let strategy = match policy {
            UnlockPolicy::None => UpdateStrategy::LockfileOnly,
            _ => self.settings.strategy,
        };

        plan.members
            .iter()
            .map(|member| {
                let previous = &member.dependency;
                let version = self
                    .project
                    .release(&previous.name, &member.target, self.scheme)
                    .map(|r| r.version.clone())
                    .unwrap_or_else(|| member.target.to_string());
                let mut dependency = previous.clone();
                dependency.version = Some(version);
                dependency.requirements =
                    self.updater
                        .update(&previous.requirements, &member.target, strategy, None);
                UpdatedDependency {
                    dependency,
                    previous_version: coordinator.previous_version(previous, &member.target),
                    previous_requirements: previous.requirements.clone(),
                }
            })
            .filter(|u| {
                let noop = u.is_noop();
                if noop {
                    debug!(dependency = %u.dependency.name, "dropping no-op update");
                }
                !noop
            })
            .collect()
    }

    /// The narrowest unlock level, up to `max`, at which an update works
    ///
    /// Lockfile-only updates are considered only when requirements may not
    /// change. Returns `None` when the update is not possible.
    pub fn requirements_to_unlock(&self, max: UnlockPolicy) -> Option<UnlockPolicy> {
        if self.settings.strategy == UpdateStrategy::LockfileOnly || max == UnlockPolicy::None {
            return self
                .can_update(UnlockPolicy::None)
                .then_some(UnlockPolicy::None);
        }
        if self.can_update(UnlockPolicy::Own) {
            return Some(UnlockPolicy::Own);
        }
        if max == UnlockPolicy::All && self.can_update(UnlockPolicy::All) {
            return Some(UnlockPolicy::All);
        }
        None
    }

    /// Evaluate every query into one decision
    pub fn decide(&self, max: UnlockPolicy) -> Result<UpdateDecision, EngineError> {
        let vulnerable = self.is_vulnerable();
        let lowest_security_fix_version = if vulnerable {
            self.lowest_security_fix_version()?
        } else {
            None
        };
        let unlock = self.requirements_to_unlock(max);
        let updated_dependencies = unlock
            .map(|policy| self.updated_dependencies(policy))
            .unwrap_or_default();

        Ok(UpdateDecision {
            dependency: self.dependency.name.clone(),
            current_version: self.dependency.version.clone(),
            latest_version: self.latest_version().map(|v| v.to_string()),
            latest_resolvable_version: self.latest_resolvable_version().map(|v| v.to_string()),
            lowest_security_fix_version: lowest_security_fix_version.map(|v| v.to_string()),
            vulnerable,
            can_update: CanUpdate {
                none: self.can_update(UnlockPolicy::None),
                own: self.can_update(UnlockPolicy::Own),
                all: self.can_update(UnlockPolicy::All),
            },
            unlock,
            updated_dependencies,
        })
    }
}

/// First release carrying `tag`, parsed
fn tagged<'r>(
    releases: &'r [Release],
    tag: &str,
    scheme: &dyn Scheme,
) -> Option<(&'r Release, Version)> {
    releases
        .iter()
        .filter(|r| r.dist_tags.iter().any(|t| t == tag))
        .find_map(|r| scheme.parse_version(&r.version).ok().map(|v| (r, v)))
}

/// Decides which dist-tag, if any, picks the target version
///
/// A requirement naming a published tag resolves to that tag. Otherwise the
/// `latest` tag is preferred when its version survived the pool filters, is
/// not below the current version and is not below a requirement's floor.
fn resolve_dist_tag(
    dependency: &Dependency,
    releases: &[Release],
    scheme: &dyn Scheme,
    current: Option<&Version>,
    pool: &CandidatePool,
) -> DistTag {
    let requested = dependency
        .requirements
        .iter()
        .filter_map(Requirement::text)
        .map(str::trim)
        .find(|text| releases.iter().any(|r| r.dist_tags.iter().any(|t| t == text)));
    if let Some(tag) = requested {
        let version = tagged(releases, tag, scheme)
            .filter(|(release, _)| !release.is_withdrawn())
            .map(|(_, version)| version);
        debug!(dependency = %dependency.name, tag, version = ?version.as_ref().map(Version::to_string), "requirement names a dist-tag");
        return DistTag::Requested(version);
    }

    let Some((_, latest)) = tagged(releases, "latest", scheme) else {
        return DistTag::Untagged;
    };
    let floor_above = dependency
        .requirements
        .iter()
        .filter_map(Requirement::text)
        .filter_map(|text| {
            scheme
                .parse_version(text.trim().trim_start_matches(['^', '~', '>', '=']))
                .ok()
        })
        .any(|floor| floor > latest);
    let wanted = pool.versions().any(|v| *v == latest)
        && current.map_or(true, |current| *current <= latest)
        && !floor_above;
    if wanted {
        DistTag::Latest(latest)
    } else {
        DistTag::Untagged
    }
}

/// Parses the current version; a commit SHA resolves through the release
/// that was built from it
fn resolve_current(
    dependency: &Dependency,
    project: &ProjectSnapshot,
    scheme: &dyn Scheme,
) -> Result<Option<Version>, EngineError> {
    let Some(raw) = dependency.version.as_deref() else {
        return Ok(None);
    };

    let git_sourced = dependency.requirements.iter().any(Requirement::is_git);
    if looks_like_commit(raw) || (git_sourced && !scheme.is_valid(raw)) {
        return project
            .releases_for(&dependency.name)
            .iter()
            .filter(|r| r.commit_sha.as_deref().is_some_and(|sha| sha.starts_with(raw)))
            .find_map(|r| scheme.parse_version(&r.version).ok())
            .map(Some)
            .ok_or_else(|| EngineError::invalid_version(raw, dependency.package_manager));
    }

    scheme.parse_version(raw).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PackageManager, Release, RequirementLink, RequirementSource};
    use crate::update::CooldownConfig;
    use chrono::{Duration, TimeZone};

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn retry(version: &str, requirement: &str) -> Dependency {
        Dependency::new("retry", Some(version), PackageManager::Pub)
            .with_requirement(Requirement::new(Some(requirement), "pubspec.yaml"))
    }

    fn retry_project(dependency: Dependency) -> ProjectSnapshot {
        ProjectSnapshot::new(vec![dependency]).with_releases(
            "retry",
            vec![
                Release::new("1.0.0"),
                Release::new("2.0.0"),
                Release::new("3.0.0"),
                Release::new("3.1.0"),
            ],
        )
    }

    fn settings() -> UpdateSettings {
        UpdateSettings::new(UpdateStrategy::BumpVersions)
    }

    fn vulnerable_below_three() -> Vec<SecurityAdvisory> {
        vec![SecurityAdvisory::new("retry", PackageManager::Pub).with_vulnerable("<3.0.0")]
    }

    #[test]
    fn test_no_update_within_requirement() {
        let project = retry_project(retry("2.0.0", "^2.0.0"));
        let settings = settings();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();

        assert_eq!(checker.latest_resolvable_version().unwrap().to_string(), "2.0.0");
        assert!(!checker.can_update(UnlockPolicy::None));
        assert!(checker.can_update(UnlockPolicy::Own));
        assert_eq!(checker.latest_version().unwrap().to_string(), "3.1.0");
    }

    #[test]
    fn test_lowest_security_fix() {
        let project = retry_project(retry("2.0.0", "^2.0.0"));
        let settings = settings();
        let advisories = vulnerable_below_three();
        let checker =
            UpdateChecker::new(&project.dependencies[0], &project, &settings, &advisories).unwrap();

        assert!(checker.is_vulnerable());
        assert_eq!(
            checker.lowest_security_fix_version().unwrap().unwrap().to_string(),
            "3.0.0"
        );
        assert_eq!(checker.lowest_resolvable_security_fix_version().unwrap(), None);

        let updates = checker.updated_dependencies(UnlockPolicy::Own);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].dependency.version.as_deref(), Some("3.0.0"));
        assert_eq!(updates[0].dependency.requirements[0].text(), Some("^3.0.0"));
    }

    #[test]
    fn test_security_fix_on_safe_version_is_contract_violation() {
        let project = retry_project(retry("3.0.0", "^3.0.0"));
        let settings = settings();
        let advisories = vulnerable_below_three();
        let checker =
            UpdateChecker::new(&project.dependencies[0], &project, &settings, &advisories).unwrap();

        let err = checker.lowest_security_fix_version().unwrap_err();
        assert!(matches!(err, EngineError::DependencyNotVulnerable { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_all_ignored() {
        let project = retry_project(retry("2.0.0", "^2.0.0"));
        let raising = settings()
            .with_ignore("retry", &[">= 0"])
            .with_raise_on_ignored(true);
        let err = UpdateChecker::new(&project.dependencies[0], &project, &raising, &[])
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::AllVersionsIgnored { .. }));

        let quiet = settings().with_ignore("retry", &[">= 0"]);
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &quiet, &[]).unwrap();
        assert_eq!(checker.latest_version().unwrap().to_string(), "2.0.0");
        assert!(!checker.can_update(UnlockPolicy::All));
    }

    #[test]
    fn test_invalid_ignore_condition_is_fatal() {
        let project = retry_project(retry("2.0.0", "^2.0.0"));
        let settings = settings().with_ignore("retry", &["not a range"]);
        let err = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[])
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::InvalidIgnoreCondition { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_invalid_current_version() {
        let project = retry_project(retry("not-a-version", "^2.0.0"));
        let settings = settings();
        let err = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[])
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::InvalidVersion { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_commit_sha_resolves_through_release() {
        let dependency = Dependency::new("lib", Some("abc1234"), PackageManager::Npm).with_requirement(
            Requirement::new(None, "package.json").with_source(RequirementSource::Git {
                url: "https://github.com/org/lib".to_string(),
                reference: Some("v1.0.0".to_string()),
            }),
        );
        let project = ProjectSnapshot::new(vec![dependency]).with_releases(
            "lib",
            vec![
                Release::new("1.0.0").with_commit_sha("abc1234def5678"),
                Release::new("1.1.0").with_commit_sha("9876543fedcba"),
            ],
        );
        let settings = settings();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();
        assert_eq!(checker.current_version().unwrap().to_string(), "1.0.0");

        let updates = checker.updated_dependencies(UnlockPolicy::Own);
        assert_eq!(updates.len(), 1);
        assert_eq!(
            updates[0].dependency.requirements[0].source,
            Some(RequirementSource::Git {
                url: "https://github.com/org/lib".to_string(),
                reference: Some("v1.1.0".to_string()),
            })
        );
    }

    #[test]
    fn test_bundled_dependency_never_updates() {
        let project = retry_project(retry("2.0.0", "^2.0.0").with_bundled(true));
        let settings = settings();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();
        let decision = checker.decide(UnlockPolicy::All).unwrap();
        assert_eq!(decision.can_update, CanUpdate::default());
        assert!(decision.updated_dependencies.is_empty());
        assert_eq!(decision.unlock, None);
    }

    #[test]
    fn test_requirements_to_unlock() {
        let project = retry_project(retry("2.0.0", "^2.0.0"));
        let settings = settings();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();
        assert_eq!(checker.requirements_to_unlock(UnlockPolicy::None), None);
        assert_eq!(
            checker.requirements_to_unlock(UnlockPolicy::All),
            Some(UnlockPolicy::Own)
        );

        let lockfile = UpdateSettings::new(UpdateStrategy::LockfileOnly);
        let project = retry_project(retry("2.0.0", ">=2.0.0"));
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &lockfile, &[]).unwrap();
        assert_eq!(
            checker.requirements_to_unlock(UnlockPolicy::All),
            Some(UnlockPolicy::None)
        );
        let updates = checker.updated_dependencies(UnlockPolicy::None);
        assert_eq!(updates[0].dependency.version.as_deref(), Some("3.1.0"));
        assert_eq!(updates[0].dependency.requirements[0].text(), Some(">=2.0.0"));
    }

    #[test]
    fn test_unlock_not_possible_when_own_blocked() {
        let linked = |name: &str| {
            Dependency::new(name, Some("1.0"), PackageManager::Maven).with_requirement(
                Requirement::new(Some("[1.0,2.0)"), "pom.xml").with_link(
                    RequirementLink::Property {
                        name: "foo.version".to_string(),
                        declared_in: None,
                    },
                ),
            )
        };
        let releases = || vec![Release::new("1.0"), Release::new("1.5"), Release::new("2.0")];
        let project = ProjectSnapshot::new(vec![linked("org.foo:core"), linked("org.foo:extra")])
            .with_releases("org.foo:core", releases())
            .with_releases("org.foo:extra", releases());
        let settings = settings();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();

        // the lockfile could move within the range, but requirements may change
        assert!(checker.can_update(UnlockPolicy::None));
        assert!(!checker.can_update(UnlockPolicy::Own));
        assert_eq!(checker.requirements_to_unlock(UnlockPolicy::Own), None);

        let decision = checker.decide(UnlockPolicy::Own).unwrap();
        assert_eq!(decision.unlock, None);
        assert!(decision.updated_dependencies.is_empty());
    }

    fn npm_project(version: &str, requirement: &str, releases: Vec<Release>) -> ProjectSnapshot {
        let dependency = Dependency::new("react", Some(version), PackageManager::Npm)
            .with_requirement(Requirement::new(Some(requirement), "package.json"));
        ProjectSnapshot::new(vec![dependency]).with_releases("react", releases)
    }

    #[test]
    fn test_unlocked_dependency_sees_prereleases() {
        let dependency = Dependency::new("react", None, PackageManager::Npm)
            .with_requirement(Requirement::new(Some("^1.0.0"), "package.json"));
        let project = ProjectSnapshot::new(vec![dependency]).with_releases(
            "react",
            vec![Release::new("1.0.0"), Release::new("2.0.0-beta.1")],
        );
        let settings = settings();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();

        assert_eq!(checker.latest_version().unwrap().to_string(), "2.0.0-beta.1");
        assert_eq!(checker.latest_resolvable_version().unwrap().to_string(), "1.0.0");
    }

    #[test]
    fn test_latest_dist_tag_caps_target() {
        let project = npm_project(
            "1.0.0",
            "^1.0.0",
            vec![
                Release::new("1.0.0"),
                Release::new("1.5.0").with_dist_tag("latest"),
                Release::new("2.0.0"),
            ],
        );
        let settings = settings();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();

        assert_eq!(checker.latest_version().unwrap().to_string(), "1.5.0");
        let updates = checker.updated_dependencies(UnlockPolicy::All);
        assert_eq!(updates[0].dependency.version.as_deref(), Some("1.5.0"));
        assert_eq!(updates[0].dependency.requirements[0].text(), Some("^1.5.0"));
    }

    #[test]
    fn test_latest_dist_tag_below_current_is_ignored() {
        let project = npm_project(
            "1.6.0",
            "^1.6.0",
            vec![
                Release::new("1.5.0").with_dist_tag("latest"),
                Release::new("1.6.0"),
                Release::new("2.0.0"),
            ],
        );
        let settings = settings();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();
        assert_eq!(checker.latest_version().unwrap().to_string(), "2.0.0");
    }

    #[test]
    fn test_ignored_latest_dist_tag_is_ignored() {
        let project = npm_project(
            "1.0.0",
            "^1.0.0",
            vec![
                Release::new("1.0.0"),
                Release::new("1.5.0").with_dist_tag("latest"),
                Release::new("2.0.0"),
            ],
        );
        let settings = settings().with_ignore("react", &["1.5.0"]);
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();
        assert_eq!(checker.latest_version().unwrap().to_string(), "2.0.0");
    }

    #[test]
    fn test_requirement_naming_dist_tag_follows_it() {
        let project = npm_project(
            "1.0.0",
            "next",
            vec![
                Release::new("1.0.0").with_dist_tag("latest"),
                Release::new("2.0.0-rc.1").with_dist_tag("next"),
                Release::new("3.0.0-alpha.1"),
            ],
        );
        let settings = settings();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();

        assert_eq!(checker.latest_version().unwrap().to_string(), "2.0.0-rc.1");
        assert_eq!(
            checker.latest_resolvable_version().unwrap().to_string(),
            "2.0.0-rc.1"
        );
        let updates = checker.updated_dependencies(UnlockPolicy::None);
        assert_eq!(updates[0].dependency.version.as_deref(), Some("2.0.0-rc.1"));
        assert_eq!(updates[0].dependency.requirements[0].text(), Some("next"));
    }

    #[test]
    fn test_requirement_naming_withdrawn_dist_tag_stays() {
        let project = npm_project(
            "1.0.0",
            "next",
            vec![
                Release::new("1.0.0"),
                Release::new("2.0.0-rc.1").with_dist_tag("next").yanked(),
                Release::new("2.0.0"),
            ],
        );
        let settings = settings();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();

        assert_eq!(checker.latest_version().unwrap().to_string(), "1.0.0");
        assert_eq!(checker.latest_resolvable_version(), None);
        assert!(!checker.can_update(UnlockPolicy::All));
    }

    #[test]
    fn test_cooldown_holds_back_recent_release() {
        let now = fixed_time();
        let dependency = retry("2.0.0", "^2.0.0");
        let project = ProjectSnapshot::new(vec![dependency]).with_releases(
            "retry",
            vec![
                Release::new("2.0.0").with_released_at(now - Duration::days(100)),
                Release::new("3.0.0").with_released_at(now - Duration::days(20)),
                Release::new("3.1.0").with_released_at(now - Duration::days(1)),
            ],
        );
        let settings = settings().with_cooldown(CooldownConfig::new(7));
        let checker =
            UpdateChecker::with_time(&project.dependencies[0], &project, &settings, &[], now).unwrap();
        assert_eq!(checker.latest_version().unwrap().to_string(), "3.0.0");
    }

    #[test]
    fn test_unlocked_dependency_requires_requirement_change() {
        let dependency = Dependency::new("retry", None, PackageManager::Pub)
            .with_requirement(Requirement::new(Some("^2.0.0"), "pubspec.yaml"));
        let project = retry_project(dependency);
        let settings = settings();
        let checker = UpdateChecker::new(&project.dependencies[0], &project, &settings, &[]).unwrap();

        assert!(!checker.can_update(UnlockPolicy::None));
        let updates = checker.updated_dependencies(UnlockPolicy::Own);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].previous_version.as_deref(), Some("2.0.0"));
        assert_eq!(updates[0].dependency.requirements[0].text(), Some("^3.1.0"));
    }

    #[test]
    fn test_looks_like_commit() {
        assert!(looks_like_commit("abc1234"));
        assert!(!looks_like_commit("1234567"));
        assert!(!looks_like_commit("1.2.3"));
    }
}
