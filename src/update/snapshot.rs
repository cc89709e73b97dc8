//! Immutable view of a project during one evaluation

use crate::domain::{Dependency, Release, RequirementLink};
use crate::scheme::{Scheme, Version};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A project's dependencies and the releases known for each of them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    /// Dependencies in discovery order
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    /// Releases by dependency name
    #[serde(default)]
    pub releases: HashMap<String, Vec<Release>>,
}

impl ProjectSnapshot {
    pub fn new(dependencies: Vec<Dependency>) -> Self {
        Self {
            dependencies,
            releases: HashMap::new(),
        }
    }

    /// Add the releases of one dependency (builder pattern)
    pub fn with_releases(mut self, name: &str, releases: Vec<Release>) -> Self {
        self.releases.insert(name.to_string(), releases);
        self
    }

    /// Releases known for `name`
    pub fn releases_for(&self, name: &str) -> &[Release] {
        self.releases.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Finds the release of `name` equal to `version`
    pub fn release(&self, name: &str, version: &Version, scheme: &dyn Scheme) -> Option<&Release> {
        self.releases_for(name)
            .iter()
            .find(|r| scheme.parse_version(&r.version).is_ok_and(|v| &v == version))
    }

    /// Finds a top-level dependency by identity
    pub fn find(&self, other: &Dependency) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.same_identity(other))
    }

    /// Other top-level dependencies of the same package manager
    pub fn siblings<'a>(&'a self, dependency: &'a Dependency) -> impl Iterator<Item = &'a Dependency> {
        self.dependencies.iter().filter(move |d| {
            d.is_top_level()
                && d.package_manager == dependency.package_manager
                && !d.same_identity(dependency)
        })
    }

    /// Siblings declaring their version through the same property or set
    pub fn linked_siblings<'a>(&'a self, dependency: &'a Dependency) -> Vec<&'a Dependency> {
        let links: Vec<&RequirementLink> = dependency.links().collect();
        if links.is_empty() {
            return Vec::new();
        }
        self.siblings(dependency)
            .filter(|d| d.links().any(|l| links.iter().any(|own| own.shares_version_with(l))))
            .collect()
    }

    /// Position of a dependency in discovery order
    pub fn position(&self, dependency: &Dependency) -> usize {
        self.dependencies
            .iter()
            .position(|d| d.same_identity(dependency))
            .unwrap_or(usize::MAX)
    }
}
