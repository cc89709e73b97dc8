//! Update decision types

use super::{Dependency, Requirement};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Textual rewrite policy for requirement strings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStrategy {
    /// Only the resolved version moves
    LockfileOnly,
    /// Widen ranges that no longer admit the new version
    WidenRanges,
    /// Always rewrite requirements to the new version
    #[default]
    BumpVersions,
    /// Rewrite requirements only when they no longer admit the new version
    BumpVersionsIfNecessary,
}

impl UpdateStrategy {
    /// Returns the configuration name of the strategy
    pub fn name(&self) -> &'static str {
        match self {
            UpdateStrategy::LockfileOnly => "lockfile_only",
            UpdateStrategy::WidenRanges => "widen_ranges",
            UpdateStrategy::BumpVersions => "bump_versions",
            UpdateStrategy::BumpVersionsIfNecessary => "bump_versions_if_necessary",
        }
    }
}

impl fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for UpdateStrategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "lockfile_only" => Ok(UpdateStrategy::LockfileOnly),
            "widen_ranges" => Ok(UpdateStrategy::WidenRanges),
            "bump_versions" => Ok(UpdateStrategy::BumpVersions),
            "bump_versions_if_necessary" => Ok(UpdateStrategy::BumpVersionsIfNecessary),
            other => Err(EngineError::UnknownUpdateStrategy {
                value: other.to_string(),
            }),
        }
    }
}

/// How much of the requirement surface an update may change
///
/// Ordered: `None < Own < All`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum UnlockPolicy {
    /// Lockfile-only bump within existing requirements
    #[default]
    None,
    /// This dependency's own requirements may change
    Own,
    /// Other dependencies' requirements may change too
    All,
}

impl UnlockPolicy {
    /// Returns the configuration name of the policy
    pub fn name(&self) -> &'static str {
        match self {
            UnlockPolicy::None => "none",
            UnlockPolicy::Own => "own",
            UnlockPolicy::All => "all",
        }
    }
}

impl fmt::Display for UnlockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for UnlockPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(UnlockPolicy::None),
            "own" => Ok(UnlockPolicy::Own),
            "all" => Ok(UnlockPolicy::All),
            other => Err(EngineError::UnknownUnlockPolicy {
                value: other.to_string(),
            }),
        }
    }
}

/// Feasibility of an update at each unlock level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanUpdate {
    pub none: bool,
    pub own: bool,
    pub all: bool,
}

impl CanUpdate {
    /// Returns the feasibility at `policy`
    pub fn at(&self, policy: UnlockPolicy) -> bool {
        match policy {
            UnlockPolicy::None => self.none,
            UnlockPolicy::Own => self.own,
            UnlockPolicy::All => self.all,
        }
    }
}

/// A dependency after the update, paired with what it replaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedDependency {
    /// The dependency carrying its new version and requirements
    pub dependency: Dependency,
    /// Version before the update; absent if unknown or unchanged
    pub previous_version: Option<String>,
    /// Requirements before the update, positionally paired with the new ones
    pub previous_requirements: Vec<Requirement>,
}

impl UpdatedDependency {
    /// Returns true if neither the version nor any requirement text changed
    pub fn is_noop(&self) -> bool {
        let same_version = match &self.previous_version {
            Some(previous) => self.dependency.version.as_deref() == Some(previous.as_str()),
            None => true,
        };
        same_version && self.dependency.requirements == self.previous_requirements
    }

    /// Returns the requirements whose text changed, as (old, new) pairs
    pub fn changed_requirements(&self) -> Vec<(&Requirement, &Requirement)> {
        self.previous_requirements
            .iter()
            .zip(self.dependency.requirements.iter())
            .filter(|(old, new)| old != new)
            .collect()
    }
}

impl fmt::Display for UpdatedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} → {}",
            self.dependency.name,
            self.previous_version.as_deref().unwrap_or("?"),
            self.dependency.version.as_deref().unwrap_or("?")
        )
    }
}

/// The engine's answer for one dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDecision {
    /// Name of the evaluated dependency
    pub dependency: String,
    /// Current version, if locked
    pub current_version: Option<String>,
    /// Newest acceptable version upstream, ignoring requirements
    pub latest_version: Option<String>,
    /// Newest version admitted by the current requirements
    pub latest_resolvable_version: Option<String>,
    /// Lowest non-vulnerable version above current, for vulnerable dependencies
    pub lowest_security_fix_version: Option<String>,
    /// Whether the current version matches a security advisory
    pub vulnerable: bool,
    /// Feasibility per unlock level
    pub can_update: CanUpdate,
    /// Unlock level used to materialise `updated_dependencies`
    pub unlock: Option<UnlockPolicy>,
    /// Updates to apply, primary dependency first
    pub updated_dependencies: Vec<UpdatedDependency>,
}

impl UpdateDecision {
    /// Returns true if the decision carries at least one update
    pub fn has_updates(&self) -> bool {
        !self.updated_dependencies.is_empty()
    }
}

/// Result of evaluating a single dependency in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    /// The engine reached a decision
    Decided { decision: UpdateDecision },
    /// The dependency cannot be auto-updated
    NoUpdate { reason: String },
    /// Evaluation was abandoned; retry later
    Undetermined { reason: String },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Decided { decision } if decision.has_updates() => {
                let updates: Vec<String> = decision
                    .updated_dependencies
                    .iter()
                    .map(|u| u.to_string())
                    .collect();
                write!(f, "{}", updates.join(", "))
            }
            Outcome::Decided { decision } => write!(f, "{}: up to date", decision.dependency),
            Outcome::NoUpdate { reason } => write!(f, "no update: {}", reason),
            Outcome::Undetermined { reason } => write!(f, "undetermined: {}", reason),
        }
    }
}

/// A batch entry: which dependency, and what happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    pub dependency: Dependency,
    pub outcome: Outcome,
}

impl DependencyReport {
    /// Returns true if the engine produced updates for this dependency
    pub fn has_updates(&self) -> bool {
        matches!(&self.outcome, Outcome::Decided { decision } if decision.has_updates())
    }

    /// Returns true if evaluation was abandoned
    pub fn is_undetermined(&self) -> bool {
        matches!(self.outcome, Outcome::Undetermined { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PackageManager;

    fn updated(previous: Option<&str>, new: &str, old_req: &str, new_req: &str) -> UpdatedDependency {
        let dep = Dependency::new("lodash", Some(new), PackageManager::Npm)
            .with_requirement(Requirement::new(Some(new_req), "package.json"));
        UpdatedDependency {
            dependency: dep,
            previous_version: previous.map(str::to_string),
            previous_requirements: vec![Requirement::new(Some(old_req), "package.json")],
        }
    }

    #[test]
    fn test_update_strategy_from_str() {
        assert_eq!(
            "widen_ranges".parse::<UpdateStrategy>().unwrap(),
            UpdateStrategy::WidenRanges
        );
        assert_eq!(
            "bump_versions_if_necessary".parse::<UpdateStrategy>().unwrap(),
            UpdateStrategy::BumpVersionsIfNecessary
        );
        assert!(matches!(
            "bump".parse::<UpdateStrategy>(),
            Err(EngineError::UnknownUpdateStrategy { .. })
        ));
    }

    #[test]
    fn test_update_strategy_default_and_display() {
        assert_eq!(UpdateStrategy::default(), UpdateStrategy::BumpVersions);
        assert_eq!(UpdateStrategy::LockfileOnly.to_string(), "lockfile_only");
    }

    #[test]
    fn test_unlock_policy_ordering() {
        assert!(UnlockPolicy::None < UnlockPolicy::Own);
        assert!(UnlockPolicy::Own < UnlockPolicy::All);
        assert_eq!("all".parse::<UnlockPolicy>().unwrap(), UnlockPolicy::All);
        assert!("everything".parse::<UnlockPolicy>().is_err());
    }

    #[test]
    fn test_can_update_at() {
        let can = CanUpdate {
            none: false,
            own: true,
            all: true,
        };
        assert!(!can.at(UnlockPolicy::None));
        assert!(can.at(UnlockPolicy::Own));
    }

    #[test]
    fn test_updated_dependency_noop() {
        assert!(updated(Some("1.0.0"), "1.0.0", "^1.0.0", "^1.0.0").is_noop());
        assert!(!updated(Some("1.0.0"), "1.1.0", "^1.0.0", "^1.0.0").is_noop());
        assert!(!updated(Some("1.0.0"), "1.0.0", "^1.0.0", "^1.1.0").is_noop());
    }

    #[test]
    fn test_changed_requirements() {
        let update = updated(Some("1.0.0"), "1.1.0", "^1.0.0", "^1.1.0");
        let changed = update.changed_requirements();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].0.text(), Some("^1.0.0"));
        assert_eq!(changed[0].1.text(), Some("^1.1.0"));
    }

    #[test]
    fn test_updated_dependency_display() {
        let update = updated(Some("1.0.0"), "1.1.0", "^1.0.0", "^1.1.0");
        assert_eq!(format!("{}", update), "lodash: 1.0.0 → 1.1.0");
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = Outcome::Undetermined {
            reason: "timeout".to_string(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"type\":\"undetermined\""));
    }
}
