//! Dependency information structures

use super::{PackageManager, Requirement, RequirementLink};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Extra facts about how a dependency is installed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyMetadata {
    /// Bundled inside another package (npm `bundledDependencies`)
    #[serde(default)]
    pub bundled: bool,
}

/// Represents a package dependency
///
/// Identity is `(name, package_manager)`. The engine never mutates a
/// `Dependency`; updates are returned as new values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Package name (ecosystem-namespaced, e.g. `com.google.guava:guava`)
    pub name: String,
    /// Currently resolved version; absent for dependencies that are not locked
    #[serde(default)]
    pub version: Option<String>,
    /// Declarations of this dependency, in manifest order
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    /// The package manager this dependency belongs to
    pub package_manager: PackageManager,
    /// Installation metadata
    #[serde(default)]
    pub metadata: DependencyMetadata,
}

impl Dependency {
    /// Creates a new dependency
    pub fn new(
        name: impl Into<String>,
        version: Option<&str>,
        package_manager: PackageManager,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.map(str::to_string),
            requirements: Vec::new(),
            package_manager,
            metadata: DependencyMetadata::default(),
        }
    }

    /// Adds a requirement (builder pattern)
    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Marks the dependency as bundled (builder pattern)
    pub fn with_bundled(mut self, bundled: bool) -> Self {
        self.metadata.bundled = bundled;
        self
    }

    /// Returns true if the dependency is declared directly in a manifest
    pub fn is_top_level(&self) -> bool {
        !self.requirements.is_empty()
    }

    /// Returns true if both values refer to the same dependency
    pub fn same_identity(&self, other: &Dependency) -> bool {
        self.name == other.name && self.package_manager == other.package_manager
    }

    /// Returns the links of all requirements that share a version
    pub fn links(&self) -> impl Iterator<Item = &RequirementLink> {
        self.requirements
            .iter()
            .map(|r| &r.link)
            .filter(|link| !link.is_none())
    }

    /// Returns the current version string, or an empty string if unlocked
    pub fn version_str(&self) -> &str {
        self.version.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{} [{}]", self.name, version, self.package_manager),
            None => write!(f, "{} [{}]", self.name, self.package_manager),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dependency() -> Dependency {
        Dependency::new("lodash", Some("4.17.20"), PackageManager::Npm)
            .with_requirement(Requirement::new(Some("^4.17.20"), "package.json"))
    }

    #[test]
    fn test_dependency_new() {
        let dep = sample_dependency();
        assert_eq!(dep.name, "lodash");
        assert_eq!(dep.version.as_deref(), Some("4.17.20"));
        assert_eq!(dep.package_manager, PackageManager::Npm);
        assert!(dep.is_top_level());
        assert!(!dep.metadata.bundled);
    }

    #[test]
    fn test_transitive_dependency_is_not_top_level() {
        let dep = Dependency::new("ms", Some("2.1.3"), PackageManager::Npm);
        assert!(!dep.is_top_level());
    }

    #[test]
    fn test_same_identity() {
        let a = sample_dependency();
        let b = Dependency::new("lodash", Some("1.0.0"), PackageManager::Npm);
        let c = Dependency::new("lodash", Some("4.17.20"), PackageManager::Cargo);
        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&c));
    }

    #[test]
    fn test_links() {
        let dep = Dependency::new("com.example:foo", Some("1.0"), PackageManager::Maven)
            .with_requirement(Requirement::new(Some("1.0"), "pom.xml").with_link(
                RequirementLink::Property {
                    name: "foo.version".to_string(),
                    declared_in: None,
                },
            ))
            .with_requirement(Requirement::new(Some("1.0"), "module/pom.xml"));
        assert_eq!(dep.links().count(), 1);
    }

    #[test]
    fn test_dependency_display() {
        let dep = sample_dependency();
        assert_eq!(format!("{}", dep), "lodash@4.17.20 [npm]");

        let unlocked = Dependency::new("serde", None, PackageManager::Cargo);
        assert_eq!(format!("{}", unlocked), "serde [Cargo]");
    }

    #[test]
    fn test_dependency_serialization() {
        let dep = sample_dependency();
        let json = serde_json::to_string(&dep).unwrap();
        assert!(json.contains("\"package_manager\":\"npm_and_yarn\""));

        let deserialized: Dependency = serde_json::from_str(&json).unwrap();
        assert_eq!(dep, deserialized);
    }
}
