//! Security advisories

use super::{Dependency, PackageManager};
use serde::{Deserialize, Serialize};

/// A published vulnerability report for one package
///
/// Predicates are requirement strings in the package manager's own grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityAdvisory {
    /// Name of the affected package
    pub dependency_name: String,
    /// Package manager of the affected package
    pub package_manager: PackageManager,
    /// Ranges of affected versions
    #[serde(default)]
    pub vulnerable_versions: Vec<String>,
    /// Ranges of versions known to be safe
    #[serde(default)]
    pub safe_versions: Vec<String>,
}

impl SecurityAdvisory {
    /// Creates an advisory with no predicates
    pub fn new(dependency_name: impl Into<String>, package_manager: PackageManager) -> Self {
        Self {
            dependency_name: dependency_name.into(),
            package_manager,
            vulnerable_versions: Vec::new(),
            safe_versions: Vec::new(),
        }
    }

    /// Adds a vulnerable range (builder pattern)
    pub fn with_vulnerable(mut self, range: impl Into<String>) -> Self {
        self.vulnerable_versions.push(range.into());
        self
    }

    /// Adds a safe range (builder pattern)
    pub fn with_safe(mut self, range: impl Into<String>) -> Self {
        self.safe_versions.push(range.into());
        self
    }

    /// Returns true if this advisory concerns `dependency`
    pub fn applies_to(&self, dependency: &Dependency) -> bool {
        self.package_manager == dependency.package_manager
            && self.dependency_name.eq_ignore_ascii_case(&dependency.name)
    }
}
